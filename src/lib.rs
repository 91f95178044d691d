//! Pressure-reducing valve (PRV) network simulator.
//!
//! Simulates hourly demand, upstream pressure, friction loss, and a
//! rate-limited valve regulating either at its own outlet or at the
//! network's critical point.

/// Scenario files, presets, and validation.
pub mod config;
pub mod diagnostic;
pub mod io;
pub mod live;
/// Hydraulic model, control logic, and the tick engine.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;

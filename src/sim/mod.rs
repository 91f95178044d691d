/// Rate-limited valve actuator.
pub mod actuator;
/// Wrapping hour-of-day clock.
pub mod clock;
pub mod command;
/// Outlet setpoint calculation for the two control modes.
pub mod controller;
pub mod engine;
pub mod error;
/// Bounded rolling history window.
pub mod history;
pub mod kpi;
pub mod physics;
/// Day/night target schedule.
pub mod schedule;
pub mod types;

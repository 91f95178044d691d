//! Core simulation types: data points, operator configuration, and model parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::actuator::DEFAULT_MAX_STEP_M;
use super::clock::timestamp;
use super::controller::ControlMode;
use super::physics::{FLOW_NOISE_LPS, INLET_NOISE_M};
use super::schedule::DayNightSchedule;

/// Reference friction coefficient for `h = k * Q^2`.
pub const DEFAULT_FRICTION_COEFFICIENT: f64 = 0.045;
/// Reference base upstream pressure (m).
pub const DEFAULT_BASE_INLET_M: f64 = 65.0;
/// Reference operator target (m).
pub const DEFAULT_TARGET_M: f64 = 20.0;
/// Reference wall-clock cadence: one real second per simulated hour.
pub const DEFAULT_TICK_MS: u64 = 1000;
/// Default master seed.
pub const DEFAULT_SEED: u64 = 42;

/// One simulated hour of hydraulic state. Immutable once created.
///
/// # Examples
///
/// ```
/// use prv_sim::sim::types::SimulationDataPoint;
///
/// let p = SimulationDataPoint::new(8, 30.0, 60.0, 40.5, 40.5 - 20.0);
/// assert_eq!(p.timestamp, "08:00");
/// assert_eq!(p.critical_point_pressure_m, 20.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationDataPoint {
    /// Simulated hour (0..24).
    pub hour: u32,
    /// Network demand flow (l/s).
    pub flow_lps: f64,
    /// Upstream pressure at the valve inlet (m).
    pub inlet_pressure_m: f64,
    /// Regulated pressure at the valve outlet (m).
    pub outlet_pressure_m: f64,
    /// Pressure at the critical point: outlet minus head loss (m).
    pub critical_point_pressure_m: f64,
    /// Friction loss between outlet and critical point (m).
    pub head_loss_m: f64,
    /// `HH:00` label.
    pub timestamp: String,
}

impl SimulationDataPoint {
    /// Builds a point, deriving the critical-point pressure and timestamp.
    pub fn new(hour: u32, flow_lps: f64, inlet_m: f64, outlet_m: f64, head_loss_m: f64) -> Self {
        Self {
            hour,
            flow_lps,
            inlet_pressure_m: inlet_m,
            outlet_pressure_m: outlet_m,
            critical_point_pressure_m: outlet_m - head_loss_m,
            head_loss_m,
            timestamp: timestamp(hour),
        }
    }
}

impl fmt::Display for SimulationDataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | flow={:>6.2} L/s | inlet={:>6.2} m  outlet={:>6.2} m  \
             cp={:>6.2} m | loss={:>5.2} m",
            self.timestamp,
            self.flow_lps,
            self.inlet_pressure_m,
            self.outlet_pressure_m,
            self.critical_point_pressure_m,
            self.head_loss_m,
        )
    }
}

/// Operator-editable settings, owned by the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Where the target is measured.
    pub control_mode: ControlMode,
    /// When set, the day/night schedule drives `target_value_m` every tick.
    pub schedule_enabled: bool,
    /// Desired setpoint (m), interpreted per `control_mode`.
    pub target_value_m: f64,
    /// When set, the inlet pressure is forced to `manual_inlet_value_m`.
    pub manual_inlet_enabled: bool,
    /// Forced inlet pressure (m).
    pub manual_inlet_value_m: f64,
    /// Head loss coefficient `k` in `k * Q^2`.
    pub friction_coefficient: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::CriticalPoint,
            schedule_enabled: true,
            target_value_m: DEFAULT_TARGET_M,
            manual_inlet_enabled: false,
            manual_inlet_value_m: DEFAULT_BASE_INLET_M,
            friction_coefficient: DEFAULT_FRICTION_COEFFICIENT,
        }
    }
}

/// Which actuator position a tick's data point is computed against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOrder {
    /// Use the position from before this tick's actuator move. The pressure
    /// series then trails the displayed actuator position by one tick.
    #[default]
    Lagged,
    /// Move the actuator first and compute the point against the new position.
    ActuatorFirst,
}

/// Fixed parameters of a run.
///
/// # Examples
///
/// ```
/// use prv_sim::sim::types::ModelParams;
///
/// let params = ModelParams::default();
/// assert_eq!(params.base_inlet_m, 65.0);
/// assert_eq!(params.actuator_step_m, 12.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParams {
    /// Master random seed.
    pub seed: u64,
    /// Base upstream pressure for the diurnal inlet model (m).
    pub base_inlet_m: f64,
    /// Uniform noise amplitude on flow (l/s).
    pub flow_noise_lps: f64,
    /// Uniform noise amplitude on simulated inlet pressure (m).
    pub inlet_noise_m: f64,
    /// Maximum actuator travel per tick (m).
    pub actuator_step_m: f64,
    /// Actuator/data-point ordering within a tick.
    pub tick_order: TickOrder,
    /// Day/night target schedule.
    pub schedule: DayNightSchedule,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            base_inlet_m: DEFAULT_BASE_INLET_M,
            flow_noise_lps: FLOW_NOISE_LPS,
            inlet_noise_m: INLET_NOISE_M,
            actuator_step_m: DEFAULT_MAX_STEP_M,
            tick_order: TickOrder::Lagged,
            schedule: DayNightSchedule::default(),
        }
    }
}

impl ModelParams {
    /// Returns a copy with both noise amplitudes set to zero.
    pub fn noise_free(self) -> Self {
        Self {
            flow_noise_lps: 0.0,
            inlet_noise_m: 0.0,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_pressure_is_outlet_minus_loss() {
        let p = SimulationDataPoint::new(3, 12.0, 70.0, 26.48, 6.48);
        assert_eq!(p.critical_point_pressure_m, 26.48 - 6.48);
        assert_eq!(p.timestamp, "03:00");
    }

    #[test]
    fn default_config_matches_reference_dashboard() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.control_mode, ControlMode::CriticalPoint);
        assert!(cfg.schedule_enabled);
        assert_eq!(cfg.target_value_m, 20.0);
        assert!(!cfg.manual_inlet_enabled);
        assert_eq!(cfg.manual_inlet_value_m, 65.0);
        assert_eq!(cfg.friction_coefficient, 0.045);
    }

    #[test]
    fn noise_free_keeps_other_params() {
        let params = ModelParams {
            seed: 9,
            ..ModelParams::default()
        }
        .noise_free();
        assert_eq!(params.flow_noise_lps, 0.0);
        assert_eq!(params.inlet_noise_m, 0.0);
        assert_eq!(params.seed, 9);
    }

    #[test]
    fn data_point_display_does_not_panic() {
        let p = SimulationDataPoint::new(20, 21.0, 55.0, 39.8, 19.8);
        let s = format!("{p}");
        assert!(s.starts_with("20:00"));
    }
}

//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::diagnostic::DEFAULT_TIMEOUT;
use crate::sim::actuator::DEFAULT_MAX_STEP_M;
use crate::sim::clock::HOURS_PER_DAY;
use crate::sim::controller::ControlMode;
use crate::sim::engine::Engine;
use crate::sim::physics::{FLOW_NOISE_LPS, INLET_NOISE_M};
use crate::sim::schedule::{
    DAY_START_HOUR, DAY_TARGET_M, DayNightSchedule, NIGHT_START_HOUR, NIGHT_TARGET_M,
};
use crate::sim::types::{
    DEFAULT_BASE_INLET_M, DEFAULT_FRICTION_COEFFICIENT, DEFAULT_SEED, DEFAULT_TARGET_M,
    DEFAULT_TICK_MS, ModelParams, SimulationConfig, TickOrder,
};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed, cadence, and tick ordering.
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Upstream pressure and pipe parameters.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Initial operator control settings.
    #[serde(default)]
    pub control: ControlConfig,
    /// Manual inlet override.
    #[serde(default)]
    pub inlet: InletConfig,
    /// Day/night target schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Valve actuator dynamics.
    #[serde(default)]
    pub actuator: ActuatorConfig,
    /// Diagnostic collaborator settings.
    #[serde(default)]
    pub diagnostic: DiagnosticConfig,
}

/// Seed, cadence, and tick ordering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Master random seed.
    pub seed: u64,
    /// Wall-clock milliseconds per simulated hour in live modes (must be > 0).
    pub tick_ms: u64,
    /// `"lagged"` or `"actuator_first"`.
    pub tick_order: TickOrder,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            tick_ms: DEFAULT_TICK_MS,
            tick_order: TickOrder::Lagged,
        }
    }
}

/// Upstream pressure and pipe parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Base upstream pressure for the diurnal model (m).
    pub base_inlet_m: f64,
    /// Head loss coefficient `k` in `k * Q^2` (must be >= 0).
    pub friction_coefficient: f64,
    /// Uniform flow noise amplitude (l/s, must be >= 0).
    pub flow_noise_lps: f64,
    /// Uniform inlet noise amplitude (m, must be >= 0).
    pub inlet_noise_m: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_inlet_m: DEFAULT_BASE_INLET_M,
            friction_coefficient: DEFAULT_FRICTION_COEFFICIENT,
            flow_noise_lps: FLOW_NOISE_LPS,
            inlet_noise_m: INLET_NOISE_M,
        }
    }
}

/// Initial operator control settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// `"critical_point"` or `"fixed_outlet"`.
    pub mode: ControlMode,
    pub schedule_enabled: bool,
    /// Operator target (m); replaced by the schedule while it is enabled.
    pub target_m: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::CriticalPoint,
            schedule_enabled: true,
            target_m: DEFAULT_TARGET_M,
        }
    }
}

/// Manual inlet override.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InletConfig {
    pub manual_enabled: bool,
    /// Forced inlet pressure (m).
    pub manual_value_m: f64,
}

impl Default for InletConfig {
    fn default() -> Self {
        Self {
            manual_enabled: false,
            manual_value_m: DEFAULT_BASE_INLET_M,
        }
    }
}

/// Day/night target schedule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// First day hour (inclusive).
    pub day_start_hour: u32,
    /// First night hour (inclusive, must be > day_start_hour and <= 24).
    pub night_start_hour: u32,
    pub day_target_m: f64,
    pub night_target_m: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_start_hour: DAY_START_HOUR,
            night_start_hour: NIGHT_START_HOUR,
            day_target_m: DAY_TARGET_M,
            night_target_m: NIGHT_TARGET_M,
        }
    }
}

/// Valve actuator dynamics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Maximum setpoint travel per tick (m, must be > 0).
    pub max_step_m: f64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            max_step_m: DEFAULT_MAX_STEP_M,
        }
    }
}

/// Diagnostic collaborator settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticConfig {
    /// Upper bound on one diagnostic call (ms, must be > 0).
    pub timeout_ms: u64,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"network.friction_coefficient"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: reference network, critical-point
    /// control, schedule enabled.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the fixed-outlet preset: the valve holds the target at its
    /// own outlet, so the critical point sags under the day peaks.
    pub fn fixed_outlet() -> Self {
        Self {
            control: ControlConfig {
                mode: ControlMode::FixedOutlet,
                ..ControlConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the low-inlet preset: the inlet is forced to 8 m, below what
    /// any target needs, so the infeasible-setpoint alarm stays raised.
    pub fn low_inlet() -> Self {
        Self {
            inlet: InletConfig {
                manual_enabled: true,
                manual_value_m: 8.0,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "fixed_outlet", "low_inlet"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "fixed_outlet" => Ok(Self::fixed_outlet()),
            "low_inlet" => Ok(Self::low_inlet()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.tick_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_ms", "must be > 0"));
        }

        let net = &self.network;
        if !net.base_inlet_m.is_finite() {
            errors.push(ConfigError::new("network.base_inlet_m", "must be finite"));
        }
        for (field, value) in [
            ("network.friction_coefficient", net.friction_coefficient),
            ("network.flow_noise_lps", net.flow_noise_lps),
            ("network.inlet_noise_m", net.inlet_noise_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }

        if !self.control.target_m.is_finite() {
            errors.push(ConfigError::new("control.target_m", "must be finite"));
        }
        if !self.inlet.manual_value_m.is_finite() {
            errors.push(ConfigError::new("inlet.manual_value_m", "must be finite"));
        }

        let sch = &self.schedule;
        if sch.day_start_hour >= sch.night_start_hour {
            errors.push(ConfigError::new(
                "schedule.day_start_hour",
                "must be < schedule.night_start_hour",
            ));
        }
        if sch.night_start_hour > HOURS_PER_DAY {
            errors.push(ConfigError::new(
                "schedule.night_start_hour",
                format!("must be <= {HOURS_PER_DAY}"),
            ));
        }
        for (field, value) in [
            ("schedule.day_target_m", sch.day_target_m),
            ("schedule.night_target_m", sch.night_target_m),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }

        let step = self.actuator.max_step_m;
        if !step.is_finite() || step <= 0.0 {
            errors.push(ConfigError::new("actuator.max_step_m", "must be finite and > 0"));
        }

        if self.diagnostic.timeout_ms == 0 {
            errors.push(ConfigError::new("diagnostic.timeout_ms", "must be > 0"));
        }

        errors
    }

    /// Fixed model parameters for a run.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            seed: self.simulation.seed,
            base_inlet_m: self.network.base_inlet_m,
            flow_noise_lps: self.network.flow_noise_lps,
            inlet_noise_m: self.network.inlet_noise_m,
            actuator_step_m: self.actuator.max_step_m,
            tick_order: self.simulation.tick_order,
            schedule: DayNightSchedule {
                day_start_hour: self.schedule.day_start_hour,
                night_start_hour: self.schedule.night_start_hour,
                day_target_m: self.schedule.day_target_m,
                night_target_m: self.schedule.night_target_m,
            },
        }
    }

    /// Initial operator settings.
    pub fn initial_settings(&self) -> SimulationConfig {
        SimulationConfig {
            control_mode: self.control.mode,
            schedule_enabled: self.control.schedule_enabled,
            target_value_m: self.control.target_m,
            manual_inlet_enabled: self.inlet.manual_enabled,
            manual_inlet_value_m: self.inlet.manual_value_m,
            friction_coefficient: self.network.friction_coefficient,
        }
    }

    /// Seeds an engine for this scenario.
    pub fn build_engine(&self) -> Engine {
        Engine::new(self.model_params(), self.initial_settings())
    }

    /// Wall-clock cadence of live modes.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms)
    }

    pub fn diagnostic_timeout(&self) -> Duration {
        Duration::from_millis(self.diagnostic.timeout_ms)
    }
}

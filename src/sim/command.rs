//! Operator control commands.

use serde::Deserialize;

use super::controller::ControlMode;
use super::error::{SimError, SimResult, ensure_finite};
use super::types::SimulationConfig;

/// A single operator setter. Takes effect on the next tick and never
/// rewrites history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    SetControlMode(ControlMode),
    SetScheduleEnabled(bool),
    /// Only meaningful while the schedule is disabled; the schedule
    /// overwrites it on the next tick otherwise.
    SetTarget(f64),
    SetManualInletEnabled(bool),
    SetManualInlet(f64),
    SetFrictionCoefficient(f64),
}

impl ControlCommand {
    /// Checks the command's value without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidSetting`] for non-finite pressures or a
    /// negative or non-finite friction coefficient.
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            Self::SetTarget(v) => ensure_finite("target_value_m", v).map(drop),
            Self::SetManualInlet(v) => ensure_finite("manual_inlet_value_m", v).map(drop),
            Self::SetFrictionCoefficient(k) => {
                let k = ensure_finite("friction_coefficient", k)?;
                if k < 0.0 {
                    return Err(SimError::invalid("friction_coefficient", "must be >= 0"));
                }
                Ok(())
            }
            Self::SetControlMode(_)
            | Self::SetScheduleEnabled(_)
            | Self::SetManualInletEnabled(_) => Ok(()),
        }
    }

    /// Validates and applies the command to `config`.
    ///
    /// # Errors
    ///
    /// Returns the validation error and leaves `config` untouched.
    pub fn apply(&self, config: &mut SimulationConfig) -> SimResult<()> {
        self.validate()?;
        match *self {
            Self::SetControlMode(mode) => config.control_mode = mode,
            Self::SetScheduleEnabled(on) => config.schedule_enabled = on,
            Self::SetTarget(v) => config.target_value_m = v,
            Self::SetManualInletEnabled(on) => config.manual_inlet_enabled = on,
            Self::SetManualInlet(v) => config.manual_inlet_value_m = v,
            Self::SetFrictionCoefficient(k) => config.friction_coefficient = k,
        }
        Ok(())
    }
}

/// Partial settings update, as accepted over the wire.
///
/// Every present field becomes one [`ControlCommand`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlUpdate {
    pub control_mode: Option<ControlMode>,
    pub schedule_enabled: Option<bool>,
    pub target_value_m: Option<f64>,
    pub manual_inlet_enabled: Option<bool>,
    pub manual_inlet_value_m: Option<f64>,
    pub friction_coefficient: Option<f64>,
}

impl ControlUpdate {
    /// Expands the update into validated commands.
    ///
    /// # Errors
    ///
    /// Returns the first validation error; no commands are produced in that case.
    pub fn into_commands(self) -> SimResult<Vec<ControlCommand>> {
        let commands: Vec<ControlCommand> = [
            self.control_mode.map(ControlCommand::SetControlMode),
            self.schedule_enabled.map(ControlCommand::SetScheduleEnabled),
            self.target_value_m.map(ControlCommand::SetTarget),
            self.manual_inlet_enabled
                .map(ControlCommand::SetManualInletEnabled),
            self.manual_inlet_value_m.map(ControlCommand::SetManualInlet),
            self.friction_coefficient
                .map(ControlCommand::SetFrictionCoefficient),
        ]
        .into_iter()
        .flatten()
        .collect();

        for command in &commands {
            command.validate()?;
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_updates_the_matching_field() {
        let mut cfg = SimulationConfig::default();
        ControlCommand::SetControlMode(ControlMode::FixedOutlet)
            .apply(&mut cfg)
            .unwrap();
        ControlCommand::SetManualInlet(8.0).apply(&mut cfg).unwrap();
        ControlCommand::SetManualInletEnabled(true)
            .apply(&mut cfg)
            .unwrap();
        assert_eq!(cfg.control_mode, ControlMode::FixedOutlet);
        assert_eq!(cfg.manual_inlet_value_m, 8.0);
        assert!(cfg.manual_inlet_enabled);
    }

    #[test]
    fn negative_friction_is_rejected_and_not_applied() {
        let mut cfg = SimulationConfig::default();
        let err = ControlCommand::SetFrictionCoefficient(-0.1).apply(&mut cfg);
        assert!(err.is_err());
        assert_eq!(cfg.friction_coefficient, 0.045);
    }

    #[test]
    fn nan_target_is_rejected() {
        assert!(ControlCommand::SetTarget(f64::NAN).validate().is_err());
    }

    #[test]
    fn update_expands_in_field_order() {
        let update = ControlUpdate {
            schedule_enabled: Some(false),
            target_value_m: Some(35.0),
            ..ControlUpdate::default()
        };
        assert_eq!(
            update.into_commands().unwrap(),
            vec![
                ControlCommand::SetScheduleEnabled(false),
                ControlCommand::SetTarget(35.0),
            ]
        );
    }

    #[test]
    fn update_with_bad_field_yields_error() {
        let update = ControlUpdate {
            control_mode: Some(ControlMode::FixedOutlet),
            friction_coefficient: Some(-1.0),
            ..ControlUpdate::default()
        };
        assert!(update.into_commands().is_err());
    }
}

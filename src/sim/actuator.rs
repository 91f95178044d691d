//! Rate-limited valve actuator.
//!
//! The pilot valve cannot reach a new setpoint instantly. Each tick the
//! effective setpoint moves toward the commanded target by at most a fixed
//! step, snapping exactly onto the target once it is within one step.

use serde::{Deserialize, Serialize};

/// Reference actuator travel per tick (m of setpoint per simulated hour).
pub const DEFAULT_MAX_STEP_M: f64 = 12.0;

/// Distance from target above which the actuator is reported as moving (m).
pub const MOVING_THRESHOLD_M: f64 = 0.1;

/// Current physical setpoint of the valve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Setpoint the valve is actually regulating to (m).
    pub effective_target: f64,
}

impl ActuatorState {
    /// Creates an actuator already settled at `effective_target`.
    pub fn settled_at(effective_target: f64) -> Self {
        Self { effective_target }
    }

    /// Returns the state after one tick toward `target`.
    pub fn advanced(self, target: f64, max_step: f64) -> Self {
        Self {
            effective_target: advance_actuator(self.effective_target, target, max_step),
        }
    }

    /// Returns `true` while the actuator is still travelling toward `target`.
    pub fn is_moving(&self, target: f64) -> bool {
        (self.effective_target - target).abs() > MOVING_THRESHOLD_M
    }
}

/// Moves `effective` toward `target` by at most `max_step`.
///
/// Snaps to `target` when the remaining distance is under `max_step`, so the
/// actuator never overshoots or oscillates.
pub fn advance_actuator(effective: f64, target: f64, max_step: f64) -> f64 {
    let diff = target - effective;
    if diff.abs() < max_step {
        return target;
    }
    if diff > 0.0 {
        effective + max_step
    } else {
        effective - max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_when_within_one_step() {
        assert_eq!(advance_actuator(10.0, 22.0 - 0.5, 12.0), 21.5);
        assert_eq!(advance_actuator(22.0, 10.5, 12.0), 10.5);
    }

    #[test]
    fn steps_by_max_when_far() {
        assert_eq!(advance_actuator(10.0, 50.0, 12.0), 22.0);
        assert_eq!(advance_actuator(50.0, 10.0, 12.0), 38.0);
    }

    #[test]
    fn exact_step_distance_lands_on_target() {
        assert_eq!(advance_actuator(10.0, 22.0, 12.0), 22.0);
    }

    #[test]
    fn moving_flag_uses_threshold() {
        let actuator = ActuatorState::settled_at(20.0);
        assert!(!actuator.is_moving(20.05));
        assert!(actuator.is_moving(20.2));
    }

    #[test]
    fn finer_step_takes_several_ticks() {
        let mut actuator = ActuatorState::settled_at(10.0);
        let mut ticks = 0;
        while actuator.effective_target != 22.0 {
            actuator = actuator.advanced(22.0, 2.5);
            ticks += 1;
        }
        assert_eq!(ticks, 5);
    }
}

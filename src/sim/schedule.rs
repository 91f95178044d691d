use serde::Serialize;

use super::clock::HOURS_PER_DAY;

/// Default start of the day profile (inclusive hour).
pub const DAY_START_HOUR: u32 = 6;
/// Default start of the night profile (inclusive hour).
pub const NIGHT_START_HOUR: u32 = 23;
/// Default day-profile target pressure (m).
pub const DAY_TARGET_M: f64 = 22.0;
/// Default night-profile target pressure (m).
pub const NIGHT_TARGET_M: f64 = 10.0;

/// Day/night setpoint schedule.
///
/// Hours in `[day_start_hour, night_start_hour)` use the day target, all
/// other hours (wrapping through midnight) use the night target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayNightSchedule {
    pub day_start_hour: u32,
    pub night_start_hour: u32,
    pub day_target_m: f64,
    pub night_target_m: f64,
}

impl Default for DayNightSchedule {
    fn default() -> Self {
        Self {
            day_start_hour: DAY_START_HOUR,
            night_start_hour: NIGHT_START_HOUR,
            day_target_m: DAY_TARGET_M,
            night_target_m: NIGHT_TARGET_M,
        }
    }
}

/// The next profile switch after a given hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleChange {
    /// Hour at which the switch happens.
    pub hour: u32,
    /// Target that takes effect at `hour`.
    pub target_m: f64,
}

impl DayNightSchedule {
    /// Returns `true` when `hour` falls inside the day profile.
    pub fn is_daytime(&self, hour: u32) -> bool {
        let h = hour % HOURS_PER_DAY;
        h >= self.day_start_hour && h < self.night_start_hour
    }

    /// Scheduled target pressure for `hour`.
    pub fn target_at(&self, hour: u32) -> f64 {
        if self.is_daytime(hour) {
            self.day_target_m
        } else {
            self.night_target_m
        }
    }

    /// Returns the next profile switch strictly after `hour`.
    pub fn next_change(&self, hour: u32) -> ScheduleChange {
        if self.is_daytime(hour) {
            ScheduleChange {
                hour: self.night_start_hour,
                target_m: self.night_target_m,
            }
        } else {
            ScheduleChange {
                hour: self.day_start_hour,
                target_m: self.day_target_m,
            }
        }
    }
}

/// Target under the default 06:00–23:00 day profile: 22 m by day, 10 m by night.
pub fn scheduled_target(hour: u32) -> f64 {
    DayNightSchedule::default().target_at(hour)
}

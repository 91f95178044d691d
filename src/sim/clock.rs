/// Number of simulated hours in one day; the clock wraps at this value.
pub const HOURS_PER_DAY: u32 = 24;

/// A wrapping hour-of-day clock.
///
/// Each tick advances simulated time by one hour and wraps from 23 back
/// to 0. The clock never finishes: the simulation runs indefinitely.
///
/// # Examples
///
/// ```
/// use prv_sim::sim::clock::HourClock;
///
/// let mut clock = HourClock::new(22);
/// assert_eq!(clock.tick(), 23);
/// assert_eq!(clock.tick(), 0);
/// assert_eq!(clock.hour(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HourClock {
    /// Current simulated hour (0..24)
    hour: u32,
}

impl HourClock {
    /// Creates a clock positioned at `hour` (taken modulo 24).
    pub fn new(hour: u32) -> Self {
        Self {
            hour: hour % HOURS_PER_DAY,
        }
    }

    /// Returns the current hour.
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Returns the hour that the next tick will move to, without advancing.
    pub fn peek_next(&self) -> u32 {
        next_hour(self.hour)
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// The new current hour.
    pub fn tick(&mut self) -> u32 {
        self.hour = self.peek_next();
        self.hour
    }
}

/// Returns `(hour + 1) mod 24`.
pub fn next_hour(hour: u32) -> u32 {
    (hour % HOURS_PER_DAY + 1) % HOURS_PER_DAY
}

/// Formats an hour as an `HH:00` display timestamp.
pub fn timestamp(hour: u32) -> String {
    format!("{:02}:00", hour % HOURS_PER_DAY)
}

//! Bounded rolling window of simulation data points.

use std::collections::VecDeque;

use super::types::SimulationDataPoint;

/// Points kept in the window: one simulated day.
pub const HISTORY_LEN: usize = 24;

/// FIFO window of the most recent [`HISTORY_LEN`] data points, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    points: VecDeque<SimulationDataPoint>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(HISTORY_LEN + 1),
        }
    }

    /// Appends `point`, evicting the oldest entry once the window is full.
    pub fn push(&mut self, point: SimulationDataPoint) {
        self.points.push_back(point);
        while self.points.len() > HISTORY_LEN {
            self.points.pop_front();
        }
    }

    /// Most recent point, if any.
    pub fn latest(&self) -> Option<&SimulationDataPoint> {
        self.points.back()
    }

    /// Iterates points in chronological order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SimulationDataPoint> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copies the window into a `Vec` for display consumers.
    pub fn to_vec(&self) -> Vec<SimulationDataPoint> {
        self.points.iter().cloned().collect()
    }
}

impl FromIterator<SimulationDataPoint> for History {
    fn from_iter<I: IntoIterator<Item = SimulationDataPoint>>(iter: I) -> Self {
        let mut history = Self::new();
        for point in iter {
            history.push(point);
        }
        history
    }
}

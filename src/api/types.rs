//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::diagnostic::DiagnosticStatus;

/// Optional range query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// First hour (inclusive).
    pub from: Option<u32>,
    /// Last hour (inclusive).
    pub to: Option<u32>,
}

impl HistoryQuery {
    /// Returns `true` when `hour` lies inside the requested range.
    pub fn contains(&self, hour: u32) -> bool {
        self.from.is_none_or(|from| hour >= from) && self.to.is_none_or(|to| hour <= to)
    }
}

/// Body returned when control commands have been queued.
#[derive(Debug, Serialize)]
pub struct ControlsAccepted {
    /// Number of setters forwarded to the tick loop.
    pub queued: usize,
}

/// Body returned when a diagnostic has been started.
#[derive(Debug, Serialize)]
pub struct DiagnosticAccepted {
    pub diagnostic: DiagnosticStatus,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_query_contains_every_hour() {
        let q = HistoryQuery {
            from: None,
            to: None,
        };
        assert!((0..24).all(|h| q.contains(h)));
    }

    #[test]
    fn range_is_inclusive() {
        let q = HistoryQuery {
            from: Some(5),
            to: Some(10),
        };
        assert!(q.contains(5));
        assert!(q.contains(10));
        assert!(!q.contains(4));
        assert!(!q.contains(11));
    }
}

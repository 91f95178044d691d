//! Operator-requested diagnostic notes.
//!
//! A diagnostic runs as its own tokio task, independent of the tick loop,
//! and reports into a single-slot [`watch`] cell. Failures never propagate:
//! they are logged and replaced by [`UNAVAILABLE_MESSAGE`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::sim::controller::{ControlMode, MIN_VALVE_DROP_M};
use crate::sim::engine::Snapshot;

/// Placeholder shown whenever a diagnostic fails for any reason.
pub const UNAVAILABLE_MESSAGE: &str = "Diagnostic unavailable.";

/// Text used when a backend answers with nothing.
pub const EMPTY_RESPONSE_MESSAGE: &str = "No diagnosis.";

/// Idle prompt line shown before any diagnostic is requested.
pub const IDLE_MESSAGE: &str = "> Monitoring network pressure transients...";

/// Default upper bound on one diagnostic call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors a diagnostic backend can report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiagnosticError {
    #[error("diagnostic backend failed: {0}")]
    Backend(String),
    #[error("diagnostic timed out after {0:?}")]
    Timeout(Duration),
    #[error("diagnostic task was cancelled")]
    Cancelled,
}

/// Values the diagnostic is asked about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRequest {
    pub hour: u32,
    pub timestamp: String,
    pub is_daytime: bool,
    pub control_mode: ControlMode,
    pub target_m: f64,
    pub inlet_pressure_m: f64,
    pub flow_lps: f64,
}

impl DiagnosticRequest {
    /// Captures the request from a live snapshot.
    ///
    /// Returns `None` before the first data point exists.
    pub fn from_snapshot(snapshot: &Snapshot) -> Option<Self> {
        let latest = snapshot.latest.as_ref()?;
        Some(Self {
            hour: latest.hour,
            timestamp: latest.timestamp.clone(),
            is_daytime: snapshot.is_daytime,
            control_mode: snapshot.config.control_mode,
            target_m: snapshot.config.target_value_m,
            inlet_pressure_m: latest.inlet_pressure_m,
            flow_lps: latest.flow_lps,
        })
    }

    /// Renders the request as a technical natural-language prompt.
    pub fn prompt(&self) -> String {
        format!(
            "Analyze the pressure-reducing valve. Time: {} ({}). \
             Mode: {}. Target: {:.0} m. Inlet: {:.1} m. Flow: {:.1} L/s. \
             Explain the difference between regulating at the critical point \
             and regulating at the valve outlet. Answer technically and concisely.",
            self.timestamp,
            if self.is_daytime { "day" } else { "night" },
            self.control_mode,
            self.target_m,
            self.inlet_pressure_m,
            self.flow_lps,
        )
    }
}

/// Boxed future returned by [`Diagnostician::diagnose`].
pub type DiagnosticFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, DiagnosticError>> + Send + 'a>>;

/// An opaque request/response diagnostic backend.
pub trait Diagnostician: Send + Sync {
    fn diagnose(&self, request: DiagnosticRequest) -> DiagnosticFuture<'_>;
}

/// Offline backend that writes a note from the request values alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedDiagnostician;

impl RuleBasedDiagnostician {
    /// Builds the note synchronously.
    pub fn note(request: &DiagnosticRequest) -> String {
        let headroom = request.inlet_pressure_m - MIN_VALVE_DROP_M - request.target_m;
        let period = if request.is_daytime { "Day" } else { "Night" };
        let mode_line = match request.control_mode {
            ControlMode::CriticalPoint => format!(
                "Regulating at the critical point: the valve raises its outlet by the \
                 friction loss at {:.1} L/s so the far end of the network holds {:.0} m.",
                request.flow_lps, request.target_m
            ),
            ControlMode::FixedOutlet => format!(
                "Regulating at the valve outlet: {:.0} m is held at the valve, so the \
                 critical point drops by the full friction loss at {:.1} L/s.",
                request.target_m, request.flow_lps
            ),
        };
        let feasibility = if headroom < 0.0 {
            format!(
                "ALARM: inlet {:.1} m cannot support the target after the {:.0} m valve drop \
                 ({:.1} m short).",
                request.inlet_pressure_m, MIN_VALVE_DROP_M, -headroom
            )
        } else {
            format!("Inlet headroom over target: {headroom:.1} m.")
        };
        format!(
            "[{} {}] {} {} Critical-point control trims excess pressure at low demand, \
             which reduces leakage and bursts; outlet control is simpler but over-pressurizes \
             the network at night.",
            request.timestamp, period, mode_line, feasibility
        )
    }
}

impl Diagnostician for RuleBasedDiagnostician {
    fn diagnose(&self, request: DiagnosticRequest) -> DiagnosticFuture<'_> {
        Box::pin(async move { Ok(Self::note(&request)) })
    }
}

/// Observable state of the diagnostic slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum DiagnosticStatus {
    Idle,
    Loading,
    Ready(String),
    /// Holds [`UNAVAILABLE_MESSAGE`].
    Failed(String),
}

impl DiagnosticStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl fmt::Display for DiagnosticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str(IDLE_MESSAGE),
            Self::Loading => f.write_str("Analyzing..."),
            Self::Ready(text) | Self::Failed(text) => f.write_str(text),
        }
    }
}

/// Single-slot diagnostic runner.
///
/// A new request aborts any diagnostic still in flight, so the slot always
/// reflects the most recent request.
pub struct DiagnosticService {
    backend: Arc<dyn Diagnostician>,
    status: watch::Sender<DiagnosticStatus>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
}

impl DiagnosticService {
    pub fn new(backend: Arc<dyn Diagnostician>, timeout: Duration) -> Self {
        let (status, _) = watch::channel(DiagnosticStatus::Idle);
        Self {
            backend,
            status,
            in_flight: Mutex::new(None),
            timeout,
        }
    }

    /// Service backed by [`RuleBasedDiagnostician`].
    pub fn rule_based(timeout: Duration) -> Self {
        Self::new(Arc::new(RuleBasedDiagnostician), timeout)
    }

    /// Current slot value.
    pub fn status(&self) -> DiagnosticStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every slot change.
    pub fn subscribe(&self) -> watch::Receiver<DiagnosticStatus> {
        self.status.subscribe()
    }

    /// Starts a diagnostic in the background and returns immediately.
    ///
    /// Must be called from within a tokio runtime; outside one the slot is
    /// set to the failure placeholder.
    pub fn request(&self, request: DiagnosticRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("diagnostic requested outside a tokio runtime");
            self.status
                .send_replace(DiagnosticStatus::Failed(UNAVAILABLE_MESSAGE.to_string()));
            return;
        };

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }

        self.status.send_replace(DiagnosticStatus::Loading);
        info!(timestamp = %request.timestamp, "diagnostic requested");

        let backend = Arc::clone(&self.backend);
        let status = self.status.clone();
        let timeout = self.timeout;
        *in_flight = Some(runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, backend.diagnose(request)).await {
                Ok(result) => result,
                Err(_) => Err(DiagnosticError::Timeout(timeout)),
            };
            status.send_replace(settle(outcome));
        }));
    }

    /// Cancels the diagnostic in flight, if any, and resets the slot to idle.
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = in_flight.take() {
            task.abort();
            warn!(error = %DiagnosticError::Cancelled, "diagnostic dropped");
        }
        self.status.send_replace(DiagnosticStatus::Idle);
    }
}

/// Maps a backend outcome onto the slot value, substituting placeholders.
fn settle(outcome: Result<String, DiagnosticError>) -> DiagnosticStatus {
    match outcome {
        Ok(text) if text.trim().is_empty() => {
            DiagnosticStatus::Ready(EMPTY_RESPONSE_MESSAGE.to_string())
        }
        Ok(text) => DiagnosticStatus::Ready(text),
        Err(err) => {
            warn!(error = %err, "diagnostic failed");
            DiagnosticStatus::Failed(UNAVAILABLE_MESSAGE.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(inlet: f64) -> DiagnosticRequest {
        DiagnosticRequest {
            hour: 8,
            timestamp: "08:00".to_string(),
            is_daytime: true,
            control_mode: ControlMode::CriticalPoint,
            target_m: 22.0,
            inlet_pressure_m: inlet,
            flow_lps: 32.6,
        }
    }

    struct FailingBackend;

    impl Diagnostician for FailingBackend {
        fn diagnose(&self, _request: DiagnosticRequest) -> DiagnosticFuture<'_> {
            Box::pin(async { Err(DiagnosticError::Backend("connection refused".into())) })
        }
    }

    struct EmptyBackend;

    impl Diagnostician for EmptyBackend {
        fn diagnose(&self, _request: DiagnosticRequest) -> DiagnosticFuture<'_> {
            Box::pin(async { Ok(String::new()) })
        }
    }

    struct StalledBackend;

    impl Diagnostician for StalledBackend {
        fn diagnose(&self, _request: DiagnosticRequest) -> DiagnosticFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("late".to_string())
            })
        }
    }

    async fn wait_settled(rx: &mut watch::Receiver<DiagnosticStatus>) -> DiagnosticStatus {
        rx.wait_for(|s| matches!(s, DiagnosticStatus::Ready(_) | DiagnosticStatus::Failed(_)))
            .await
            .map(|s| s.clone())
            .unwrap_or(DiagnosticStatus::Idle)
    }

    #[test]
    fn prompt_mentions_all_values() {
        let prompt = request(68.1).prompt();
        assert!(prompt.contains("08:00"));
        assert!(prompt.contains("day"));
        assert!(prompt.contains("critical point"));
        assert!(prompt.contains("22 m"));
        assert!(prompt.contains("68.1 m"));
        assert!(prompt.contains("32.6 L/s"));
    }

    #[test]
    fn rule_based_note_flags_infeasible_target() {
        assert!(RuleBasedDiagnostician::note(&request(8.0)).contains("ALARM"));
        assert!(!RuleBasedDiagnostician::note(&request(68.0)).contains("ALARM"));
    }

    #[test]
    fn request_outside_runtime_fails_soft() {
        let service = DiagnosticService::rule_based(DEFAULT_TIMEOUT);
        service.request(request(65.0));
        assert_eq!(
            service.status(),
            DiagnosticStatus::Failed(UNAVAILABLE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn rule_based_request_becomes_ready() {
        let service = DiagnosticService::rule_based(DEFAULT_TIMEOUT);
        let mut rx = service.subscribe();
        service.request(request(65.0));
        let status = wait_settled(&mut rx).await;
        assert!(matches!(status, DiagnosticStatus::Ready(ref t) if t.contains("08:00")));
    }

    #[tokio::test]
    async fn failing_backend_yields_placeholder() {
        let service = DiagnosticService::new(Arc::new(FailingBackend), DEFAULT_TIMEOUT);
        let mut rx = service.subscribe();
        service.request(request(65.0));
        assert_eq!(
            wait_settled(&mut rx).await,
            DiagnosticStatus::Failed(UNAVAILABLE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn empty_answer_is_replaced() {
        let service = DiagnosticService::new(Arc::new(EmptyBackend), DEFAULT_TIMEOUT);
        let mut rx = service.subscribe();
        service.request(request(65.0));
        assert_eq!(
            wait_settled(&mut rx).await,
            DiagnosticStatus::Ready(EMPTY_RESPONSE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn stalled_backend_times_out() {
        let service =
            DiagnosticService::new(Arc::new(StalledBackend), Duration::from_millis(20));
        let mut rx = service.subscribe();
        service.request(request(65.0));
        assert_eq!(
            wait_settled(&mut rx).await,
            DiagnosticStatus::Failed(UNAVAILABLE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn cancel_resets_to_idle() {
        let service = DiagnosticService::new(Arc::new(StalledBackend), DEFAULT_TIMEOUT);
        service.request(request(65.0));
        assert!(service.status().is_loading());
        service.cancel();
        assert_eq!(service.status(), DiagnosticStatus::Idle);
    }
}

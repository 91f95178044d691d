//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use super::AppState;
use super::types::{
    ControlsAccepted, DiagnosticAccepted, ErrorResponse, HistoryQuery,
};
use crate::diagnostic::{DiagnosticRequest, DiagnosticStatus};
use crate::sim::command::ControlUpdate;
use crate::sim::engine::Snapshot;
use crate::sim::kpi::DailySummary;
use crate::sim::types::SimulationDataPoint;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (status, Json(ErrorResponse::new(error)))
}

/// Returns the latest snapshot.
///
/// `GET /state` → 200 + `Snapshot` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.view.borrow().snapshot.clone())
}

/// Returns the history window, optionally filtered by hour.
///
/// `GET /history` → 200 + `Vec<SimulationDataPoint>` JSON
/// `GET /history?from=N&to=M` → points with `N <= hour <= M`
/// `GET /history?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SimulationDataPoint>>, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("`from` ({from}) must be <= `to` ({to})"),
            ));
        }
    }

    let points = state
        .view
        .borrow()
        .history
        .iter()
        .filter(|p| query.contains(p.hour))
        .cloned()
        .collect();
    Ok(Json(points))
}

/// Summarizes the history window.
///
/// `GET /summary` → 200 + `DailySummary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<DailySummary> {
    Json(DailySummary::from_history(&state.view.borrow().history))
}

/// Validates a partial settings update and queues it for the next tick.
///
/// `POST /controls` → 202 + `ControlsAccepted`
/// Malformed body or invalid value → 400 + `ErrorResponse`
/// Tick loop gone → 503 + `ErrorResponse`
pub async fn post_controls(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ControlUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(update) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let commands = update
        .into_commands()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let queued = commands.len();
    for command in commands {
        if state.commands.send(command).await.is_err() {
            warn!("control command dropped: tick loop stopped");
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "simulation is not running",
            ));
        }
    }
    Ok((StatusCode::ACCEPTED, Json(ControlsAccepted { queued })))
}

/// Starts a diagnostic for the latest snapshot.
///
/// `POST /diagnostic` → 202 + `DiagnosticAccepted`
/// No data point yet → 409 + `ErrorResponse`
pub async fn post_diagnostic(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = DiagnosticRequest::from_snapshot(&state.view.borrow().snapshot)
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "no data point to diagnose yet"))?;
    state.diagnostics.request(request);
    Ok((
        StatusCode::ACCEPTED,
        Json(DiagnosticAccepted {
            diagnostic: state.diagnostics.status(),
        }),
    ))
}

/// Returns the diagnostic slot.
///
/// `GET /diagnostic` → 200 + `DiagnosticStatus` JSON
pub async fn get_diagnostic(State(state): State<Arc<AppState>>) -> Json<DiagnosticStatus> {
    Json(state.diagnostics.status())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::diagnostic::{DEFAULT_TIMEOUT, DiagnosticService};
    use crate::live::{LiveHandle, spawn_live};
    use crate::sim::controller::ControlMode;
    use crate::sim::engine::Engine;
    use crate::sim::types::{ModelParams, SimulationConfig};

    /// A live loop that never ticks on its own within a test.
    fn make_test_state() -> (Arc<AppState>, LiveHandle) {
        let engine = Engine::new(ModelParams::default(), SimulationConfig::default());
        let handle = spawn_live(engine, Duration::from_secs(3600));
        let diagnostics = Arc::new(DiagnosticService::rule_based(DEFAULT_TIMEOUT));
        (Arc::new(AppState::from_live(&handle, diagnostics)), handle)
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn state_returns_snapshot() {
        let (state, _live) = make_test_state();
        let resp = router(state).oneshot(get("/state")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = json_body(resp).await;
        assert_eq!(json["hour"], 23);
        assert_eq!(json["timestamp"], "23:00");
        assert_eq!(json["config"]["control_mode"], "critical_point");
        assert!(json["latest"].is_object());
    }

    #[tokio::test]
    async fn history_returns_full_window() {
        let (state, _live) = make_test_state();
        let resp = router(state).oneshot(get("/history")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json.as_array().map(Vec::len), Some(24));
    }

    #[tokio::test]
    async fn history_range_query() {
        let (state, _live) = make_test_state();
        let resp = router(state)
            .oneshot(get("/history?from=5&to=10"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json.as_array().map(Vec::len), Some(6));
        assert_eq!(json[0]["hour"], 5);
        assert_eq!(json[5]["hour"], 10);
    }

    #[tokio::test]
    async fn history_invalid_range_returns_400() {
        let (state, _live) = make_test_state();
        let resp = router(state)
            .oneshot(get("/history?from=10&to=5"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn summary_covers_window() {
        let (state, _live) = make_test_state();
        let resp = router(state).oneshot(get("/summary")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["hours"], 24);
    }

    #[tokio::test]
    async fn controls_are_queued_and_applied() {
        let (state, mut live) = make_test_state();
        let resp = router(state)
            .oneshot(post_json("/controls", r#"{"control_mode":"fixed_outlet"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(resp).await["queued"], 1);

        let applied = live
            .views
            .wait_for(|v| v.snapshot.config.control_mode == ControlMode::FixedOutlet)
            .await;
        assert!(applied.is_ok());
    }

    #[tokio::test]
    async fn invalid_control_value_returns_400() {
        let (state, _live) = make_test_state();
        let resp = router(state)
            .oneshot(post_json("/controls", r#"{"friction_coefficient":-1.0}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_control_field_returns_400() {
        let (state, _live) = make_test_state();
        let resp = router(state)
            .oneshot(post_json("/controls", r#"{"valve_open":true}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn diagnostic_is_accepted_then_ready() {
        let (state, _live) = make_test_state();
        let app = router(Arc::clone(&state));

        let resp = app.clone().oneshot(get("/diagnostic")).await.unwrap();
        assert_eq!(json_body(resp).await["status"], "idle");

        let resp = app
            .clone()
            .oneshot(post_json("/diagnostic", ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let mut rx = state.diagnostics.subscribe();
        let settled = rx
            .wait_for(|s| matches!(s, DiagnosticStatus::Ready(_)))
            .await;
        assert!(settled.is_ok());

        let resp = app.oneshot(get("/diagnostic")).await.unwrap();
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ready");
        assert!(json["text"].as_str().is_some_and(|t| t.contains("23:00")));
    }
}

//! REST API over the live simulation.
//!
//! - `GET /state`: latest snapshot
//! - `GET /history`: data points, optionally filtered by hour range
//! - `GET /summary`: summary of the history window
//! - `POST /controls`: queue operator setters
//! - `GET|POST /diagnostic`: read or start a diagnostic

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::diagnostic::DiagnosticService;
use crate::live::{LiveHandle, LiveView};
use crate::sim::command::ControlCommand;

/// Shared application state.
///
/// Handlers never touch the engine: they read the latest published view and
/// forward setters to the tick loop.
pub struct AppState {
    /// Setter queue into the tick loop.
    pub commands: mpsc::Sender<ControlCommand>,
    /// Latest view published by the tick loop.
    pub view: watch::Receiver<LiveView>,
    /// Single-slot diagnostic runner.
    pub diagnostics: Arc<DiagnosticService>,
}

impl AppState {
    /// Wires the state to a spawned live loop.
    pub fn from_live(handle: &LiveHandle, diagnostics: Arc<DiagnosticService>) -> Self {
        Self {
            commands: handle.commands.clone(),
            view: handle.views.clone(),
            diagnostics,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/history", get(handlers::get_history))
        .route("/summary", get(handlers::get_summary))
        .route("/controls", post(handlers::post_controls))
        .route(
            "/diagnostic",
            get(handlers::get_diagnostic).post(handlers::post_diagnostic),
        )
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}

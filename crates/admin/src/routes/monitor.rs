//! AI site monitor routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::RequireUnlocked;
use crate::state::AppState;

/// Build the monitor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/monitor", get(show_status))
        .route("/api/monitor/scan", post(scan))
}

#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub status: String,
}

/// GET /api/monitor
async fn show_status(_: RequireUnlocked, State(state): State<AppState>) -> Json<MonitorResponse> {
    Json(MonitorResponse {
        status: state.agent().monitor_status(),
    })
}

/// POST /api/monitor/scan
async fn scan(
    _: RequireUnlocked,
    State(state): State<AppState>,
) -> Result<Json<MonitorResponse>, AppError> {
    let status = state.agent().scan_site().await?;
    Ok(Json(MonitorResponse { status }))
}

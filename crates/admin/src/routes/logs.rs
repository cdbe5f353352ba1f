//! Audit log route.

use axum::{Json, Router, extract::State, routing::get};
use prodigital_core::LogEntry;

use crate::middleware::RequireUnlocked;
use crate::state::AppState;

/// Build the log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/logs", get(list_logs))
}

/// GET /api/logs
async fn list_logs(_: RequireUnlocked, State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.agent().log().entries())
}

//! Admin command route.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::RequireUnlocked;
use crate::services::CommandReport;
use crate::state::AppState;

/// Build the command router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/commands", post(run_command))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Run one admin command.
///
/// POST /api/commands
///
/// Handled failures (no keys, malformed reply, ...) still answer 200 with
/// `"outcome": "failed"`. Blank input is 400 and a concurrent command is 409.
async fn run_command(
    _: RequireUnlocked,
    State(state): State<AppState>,
    Json(body): Json<CommandRequest>,
) -> Result<Json<CommandReport>, AppError> {
    let report = state.agent().process_command(&body.command).await?;
    Ok(Json(report))
}

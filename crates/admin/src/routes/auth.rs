//! PIN gate route handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::auth::{is_unlocked, lock, pin_accepted, unlock};
use crate::services::CommandStage;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/unlock", post(unlock_panel))
        .route("/api/lock", post(lock_panel))
        .route("/api/status", get(status))
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub unlocked: bool,
    pub busy: bool,
    pub stage: CommandStage,
}

/// POST /api/unlock
async fn unlock_panel(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let log = state.agent().log();
    if !pin_accepted(&body.pin) {
        log.error("Invalid PIN format");
        return Err(AppError::Unauthorized("Invalid PIN format".to_string()));
    }

    unlock(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    log.success("Access granted to Personal Sector");

    Ok(Json(StatusResponse {
        unlocked: true,
        busy: state.agent().is_busy(),
        stage: state.agent().stage(),
    }))
}

/// POST /api/lock
async fn lock_panel(session: Session) -> Result<Json<StatusResponse>, AppError> {
    lock(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(StatusResponse {
        unlocked: false,
        busy: false,
        stage: CommandStage::Idle,
    }))
}

/// GET /api/status
async fn status(State(state): State<AppState>, session: Session) -> Json<StatusResponse> {
    Json(StatusResponse {
        unlocked: is_unlocked(&session).await,
        busy: state.agent().is_busy(),
        stage: state.agent().stage(),
    })
}

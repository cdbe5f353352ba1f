//! Credential list routes.
//!
//! Keys are write-only over HTTP; reads return masked previews.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use crate::credentials::SlotSummary;
use crate::error::AppError;
use crate::middleware::RequireUnlocked;
use crate::state::AppState;

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/credentials",
            get(list_credentials).post(add_credential),
        )
        .route(
            "/api/credentials/{slot}",
            put(set_credential).delete(remove_credential),
        )
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AddedResponse {
    pub slot: usize,
}

/// GET /api/credentials
async fn list_credentials(
    _: RequireUnlocked,
    State(state): State<AppState>,
) -> Json<Vec<SlotSummary>> {
    Json(state.agent().credentials().await)
}

/// POST /api/credentials
async fn add_credential(
    _: RequireUnlocked,
    State(state): State<AppState>,
    Json(body): Json<CredentialRequest>,
) -> Result<(StatusCode, Json<AddedResponse>), AppError> {
    if body.value.trim().is_empty() {
        return Err(AppError::BadRequest("credential is empty".to_string()));
    }
    let slot = state.agent().add_credential(&body.value).await?;
    Ok((StatusCode::CREATED, Json(AddedResponse { slot })))
}

/// PUT /api/credentials/{slot}
///
/// A blank value clears the slot without removing it.
async fn set_credential(
    _: RequireUnlocked,
    State(state): State<AppState>,
    Path(slot): Path<usize>,
    Json(body): Json<CredentialRequest>,
) -> Result<StatusCode, AppError> {
    state.agent().set_credential(slot, &body.value).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/credentials/{slot}
async fn remove_credential(
    _: RequireUnlocked,
    State(state): State<AppState>,
    Path(slot): Path<usize>,
) -> Result<StatusCode, AppError> {
    state.agent().remove_credential(slot).await?;
    Ok(StatusCode::NO_CONTENT)
}

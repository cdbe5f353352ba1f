//! PIN gate for the Personal Sector.
//!
//! The gate accepts any PIN of exactly four characters. It keeps casual
//! visitors out of the panel and nothing more.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

/// Session key holding the unlocked flag.
pub const UNLOCKED_KEY: &str = "unlocked";

/// Required PIN length, in characters.
pub const PIN_LENGTH: usize = 4;

/// Whether `pin` opens the panel.
#[must_use]
pub fn pin_accepted(pin: &str) -> bool {
    pin.chars().count() == PIN_LENGTH
}

/// Extractor that requires an unlocked session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_: RequireUnlocked) -> impl IntoResponse {
///     "secret"
/// }
/// ```
pub struct RequireUnlocked;

/// Rejection for locked sessions.
pub struct LockedRejection;

impl IntoResponse for LockedRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "Personal Sector is locked" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireUnlocked
where
    S: Send + Sync,
{
    type Rejection = LockedRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(LockedRejection)?;

        if is_unlocked(session).await {
            Ok(Self)
        } else {
            Err(LockedRejection)
        }
    }
}

/// Whether the session has passed the PIN gate.
pub async fn is_unlocked(session: &Session) -> bool {
    session
        .get::<bool>(UNLOCKED_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

/// Mark the session as unlocked.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn unlock(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(UNLOCKED_KEY, true).await
}

/// End the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn lock(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

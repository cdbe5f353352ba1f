//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                   - Health check
//!
//! # Session (PIN gate)
//! POST   /api/unlock               - Unlock with a 4-character PIN
//! POST   /api/lock                 - End the session
//! GET    /api/status               - Unlocked flag, busy flag, command stage
//!
//! # Agent (unlocked only)
//! POST   /api/commands             - Run one admin command
//! GET    /api/logs                 - Audit log
//! GET    /api/monitor              - Last site monitor status
//! POST   /api/monitor/scan         - Run the AI site monitor
//!
//! # Credentials (unlocked only)
//! GET    /api/credentials          - Masked credential slots
//! POST   /api/credentials          - Append a credential
//! PUT    /api/credentials/{slot}   - Replace a credential
//! DELETE /api/credentials/{slot}   - Remove a credential
//!
//! # Content (unlocked only)
//! GET    /api/catalog              - Current products
//! GET    /api/site                 - Current site configuration
//! ```

use axum::{Router, routing::get};

use crate::middleware::create_session_layer;
use crate::state::AppState;

pub mod auth;
pub mod catalog;
pub mod commands;
pub mod credentials;
pub mod logs;
pub mod monitor;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(commands::router())
        .merge(logs::router())
        .merge(monitor::router())
        .merge(credentials::router())
        .merge(catalog::router())
}

/// Build the full application with sessions, ready to serve.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

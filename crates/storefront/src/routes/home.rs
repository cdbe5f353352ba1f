//! Site-wide content.

use axum::{Json, extract::State};
use prodigital_core::SiteConfig;

use crate::state::AppState;

/// GET /api/site
pub async fn site(State(state): State<AppState>) -> Json<SiteConfig> {
    Json(state.content().site_config)
}

//! Read-only views of the content the agent edits.

use axum::{Json, Router, extract::State, routing::get};
use prodigital_core::{Product, SiteConfig};

use crate::middleware::RequireUnlocked;
use crate::state::AppState;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(list_products))
        .route("/api/site", get(show_site))
}

/// GET /api/catalog
async fn list_products(_: RequireUnlocked, State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.agent().catalog().await)
}

/// GET /api/site
async fn show_site(_: RequireUnlocked, State(state): State<AppState>) -> Json<SiteConfig> {
    Json(state.agent().site_config().await)
}

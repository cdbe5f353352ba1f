//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//! GET  /api/site                - Site configuration
//! GET  /api/products            - Catalog, optional ?category= filter
//! GET  /api/products/{id}       - One catalog entry
//! ```

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;

pub mod home;
pub mod products;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/site", get(home::site))
        .route("/api/products", get(products::index))
        .route("/api/products/{id}", get(products::show))
}

/// Build the full application, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::new().allow_methods([Method::GET]))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

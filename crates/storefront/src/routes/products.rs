//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use prodigital_core::Product;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Exact category name, case-insensitive.
    pub category: Option<String>,
}

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let products = state.content().products;
    Json(filter_by_category(products, query.category.as_deref()))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .content()
        .products
        .into_iter()
        .find(|p| p.id.as_str() == id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

fn filter_by_category(products: Vec<Product>, category: Option<&str>) -> Vec<Product> {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => products
            .into_iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .collect(),
        None => products,
    }
}

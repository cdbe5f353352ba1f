//! Read-only catalog inspection.
//!
//! Reads the data directory directly. No Gemini client is built, so these
//! commands work without any API key configured.

use prodigital_core::{FileStore, Product, SiteState, StoreError};
use thiserror::Error;

use super::{SetupError, load_config};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("No product with id {0}")]
    NotFound(String),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn load() -> Result<SiteState, CatalogError> {
    let config = load_config()?;
    let store = FileStore::open(&config.data_dir)?;
    Ok(SiteState::load(&store))
}

/// Print one line per entry, optionally filtered by category.
pub fn list(category: Option<&str>) -> Result<(), CatalogError> {
    let state = load()?;
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    let products: Vec<&Product> = state
        .products
        .iter()
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .collect();

    for product in &products {
        println!(
            "{:<16} {:<28} {:<20} {:.1}",
            product.id.as_str(),
            product.name,
            product.category,
            product.rating.value()
        );
    }
    println!("{} product(s)", products.len());
    Ok(())
}

/// Print one entry as pretty JSON.
pub fn show(id: &str) -> Result<(), CatalogError> {
    let state = load()?;
    let product = state
        .products
        .iter()
        .find(|p| p.id.as_str() == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
    println!("{}", serde_json::to_string_pretty(product)?);
    Ok(())
}

/// Print the site configuration as pretty JSON.
pub fn site() -> Result<(), CatalogError> {
    let state = load()?;
    println!("{}", serde_json::to_string_pretty(&state.site_config)?);
    Ok(())
}

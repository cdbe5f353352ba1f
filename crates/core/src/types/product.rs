//! Catalog entries shown on the storefront.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Seed catalog shipped with the site.
const SEED_PRODUCTS: &str = include_str!("../../data/products.json");

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum RatingError {
    /// The value is NaN or infinite.
    #[error("rating must be a finite number")]
    NotFinite,
    /// The value is outside `0.0..=5.0`.
    #[error("rating must be between 0 and 5 (got {0})")]
    OutOfRange(f64),
}

/// Editorial star rating in `0.0..=5.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Highest possible rating.
    pub const MAX: f64 = 5.0;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not finite or outside `0.0..=5.0`.
    pub fn new(value: f64) -> Result<Self, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::NotFinite);
        }
        if !(0.0..=Self::MAX).contains(&value) {
            return Err(RatingError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Get the rating value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(0.0)
    }
}

impl TryFrom<f64> for Rating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// One pricing plan of a reviewed product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    /// Plan name ("Pro", "Guru").
    pub name: String,
    /// Display price, currency and period included ("$129.95/mo").
    pub price: String,
    /// Feature bullet points.
    #[serde(default)]
    pub features: Vec<String>,
}

/// A reviewed product or tool.
///
/// Only `id` and `name` are required when deserializing; display fields
/// default to empty so partially specified entries from the admin agent are
/// still accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub pricing: Vec<PricingTier>,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub affiliate_link: String,
    #[serde(default)]
    pub best_for: String,
}

impl Product {
    /// Collect the ids of a catalog.
    #[must_use]
    pub fn ids(products: &[Self]) -> HashSet<ProductId> {
        products.iter().map(|p| p.id.clone()).collect()
    }

    /// Return the first id that appears more than once, if any.
    #[must_use]
    pub fn first_duplicate_id(products: &[Self]) -> Option<&ProductId> {
        let mut seen = HashSet::with_capacity(products.len());
        products.iter().map(|p| &p.id).find(|id| !seen.insert(*id))
    }
}

/// The catalog shipped with the site, used when the store holds none.
#[must_use]
pub fn seed_products() -> Vec<Product> {
    serde_json::from_str(SEED_PRODUCTS).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Seed catalog is invalid, starting empty");
        Vec::new()
    })
}

//! Applies agent instructions to site state.
//!
//! [`apply`] either succeeds completely or leaves the state as it found it.

use chrono::{DateTime, Utc};
use prodigital_core::{AgentInstruction, ContactEmail, Product, ProductId, SiteConfig, SiteState};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that reject an instruction outright.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    /// Applying the instruction would leave two entries with one id.
    #[error("duplicate product id \"{0}\"")]
    DuplicateId(ProductId),

    /// The resulting entry is not a valid product.
    #[error("invalid product \"{id}\": {reason}")]
    InvalidEntry { id: String, reason: String },

    /// An update names a field products do not have.
    #[error("product \"{id}\" has no field \"{field}\"")]
    UnknownField { id: ProductId, field: String },
}

/// What an applied instruction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    NoChange {
        message: Option<String>,
    },
    Added {
        id: ProductId,
        name: String,
    },
    Updated {
        id: ProductId,
        /// camelCase names of the fields whose value changed.
        fields: Vec<String>,
    },
    Deleted {
        id: ProductId,
        removed: usize,
    },
    Replaced {
        /// New catalog length, when the catalog was replaced.
        products: Option<usize>,
        site_config: bool,
        /// The agent tried to change the protected contact address.
        contact_reset: bool,
    },
    /// The target of an update or delete does not exist.
    NotFound {
        id: ProductId,
        action: &'static str,
    },
}

impl MutationOutcome {
    /// Whether state differs from before.
    #[must_use]
    pub fn changed(&self) -> bool {
        match self {
            Self::NoChange { .. } | Self::NotFound { .. } => false,
            Self::Updated { fields, .. } => !fields.is_empty(),
            Self::Added { .. } | Self::Deleted { .. } | Self::Replaced { .. } => true,
        }
    }

    /// Default operator-facing description.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::NoChange { message } => {
                format!("AI: {}", message.as_deref().unwrap_or("No changes made."))
            }
            Self::Added { name, .. } => format!("Added new product: {name}"),
            Self::Updated { id, .. } => format!("Updated product: {id}"),
            Self::Deleted { id, .. } => format!("Deleted product: {id}"),
            Self::Replaced {
                products,
                site_config,
                ..
            } => match (products, site_config) {
                (Some(n), true) => format!("Replaced catalog ({n} products) and site configuration"),
                (Some(n), false) => format!("Replaced catalog ({n} products)"),
                (None, _) => "Replaced site configuration".to_string(),
            },
            Self::NotFound { id, action } => {
                format!("Cannot {action} product \"{id}\": no such product")
            }
        }
    }
}

/// Site configuration fields the agent is not allowed to change.
#[derive(Debug, Clone, Default)]
pub struct ProtectedFields {
    pub contact_email: ContactEmail,
}

impl ProtectedFields {
    #[must_use]
    pub const fn new(contact_email: ContactEmail) -> Self {
        Self { contact_email }
    }

    /// Force protected fields back to their constants.
    ///
    /// Returns `true` when the config proposed a different, non-empty value.
    /// A missing address is filled in without counting as an attempt.
    pub fn enforce(&self, config: &mut SiteConfig) -> bool {
        let protected = self.contact_email.as_str();
        let attempted = !config.contact_email.is_empty() && config.contact_email != protected;
        config.contact_email = protected.to_string();
        attempted
    }
}

/// Apply `instruction` to `state`.
///
/// # Errors
///
/// Returns [`MutationError`] when the result would break catalog invariants.
/// `state` is not modified in that case.
pub fn apply(
    instruction: &AgentInstruction,
    state: &mut SiteState,
    protected: &ProtectedFields,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, MutationError> {
    match instruction {
        AgentInstruction::None { message } => Ok(MutationOutcome::NoChange {
            message: message.clone(),
        }),
        AgentInstruction::Add { data, .. } => add(data, &mut state.products, now),
        AgentInstruction::Update { id, changes, .. } => update(id, changes, &mut state.products),
        AgentInstruction::Delete { id, .. } => {
            let before = state.products.len();
            state.products.retain(|p| &p.id != id);
            let removed = before - state.products.len();
            if removed == 0 {
                return Ok(MutationOutcome::NotFound {
                    id: id.clone(),
                    action: "delete",
                });
            }
            Ok(MutationOutcome::Deleted {
                id: id.clone(),
                removed,
            })
        }
        AgentInstruction::ModifyData {
            products,
            site_config,
            ..
        } => {
            if let Some(products) = products
                && let Some(dup) = Product::first_duplicate_id(products)
            {
                return Err(MutationError::DuplicateId(dup.clone()));
            }

            let mut contact_reset = false;
            if let Some(config) = site_config {
                let mut config = config.clone();
                contact_reset = protected.enforce(&mut config);
                state.site_config = config;
            }
            if let Some(products) = products {
                state.products.clone_from(products);
            }

            Ok(MutationOutcome::Replaced {
                products: products.as_ref().map(Vec::len),
                site_config: site_config.is_some(),
                contact_reset,
            })
        }
    }
}

fn add(
    data: &Map<String, Value>,
    products: &mut Vec<Product>,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, MutationError> {
    let existing = Product::ids(products);
    let explicit = data
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ProductId::from);

    let id = match explicit {
        Some(id) if existing.contains(&id) => return Err(MutationError::DuplicateId(id)),
        Some(id) => id,
        None => ProductId::generate(&existing, now),
    };

    let mut draft = data.clone();
    draft.insert("id".to_string(), Value::String(id.as_str().to_string()));
    let product: Product =
        serde_json::from_value(Value::Object(draft)).map_err(|e| MutationError::InvalidEntry {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    let name = product.name.clone();
    products.push(product);
    Ok(MutationOutcome::Added { id, name })
}

fn update(
    id: &ProductId,
    changes: &Map<String, Value>,
    products: &mut [Product],
) -> Result<MutationOutcome, MutationError> {
    let Some(target) = products.iter_mut().find(|p| &p.id == id) else {
        return Ok(MutationOutcome::NotFound {
            id: id.clone(),
            action: "update",
        });
    };

    let invalid = |e: serde_json::Error| MutationError::InvalidEntry {
        id: id.to_string(),
        reason: e.to_string(),
    };

    let Value::Object(before) = serde_json::to_value(&*target).map_err(invalid)? else {
        return Err(MutationError::InvalidEntry {
            id: id.to_string(),
            reason: "product did not serialize to an object".to_string(),
        });
    };

    if let Some(field) = changes.keys().find(|key| !before.contains_key(key.as_str())) {
        return Err(MutationError::UnknownField {
            id: id.clone(),
            field: field.clone(),
        });
    }

    let mut merged = before.clone();
    for (key, value) in changes {
        // Ids stay stable across updates.
        if key != "id" {
            merged.insert(key.clone(), value.clone());
        }
    }
    let updated: Product = serde_json::from_value(Value::Object(merged)).map_err(invalid)?;

    let after = serde_json::to_value(&updated).map_err(invalid)?;
    let fields = before
        .iter()
        .filter(|(key, value)| after.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();

    *target = updated;
    Ok(MutationOutcome::Updated {
        id: id.clone(),
        fields,
    })
}

//! Catalog entry identifiers.
//!
//! Product ids are human-readable slugs (`semrush-review`) chosen by editors or
//! by the admin agent. When the agent adds a product without one, the admin
//! panel synthesizes a time-based id with [`ProductId::generate`].

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix for synthesized product ids.
const GENERATED_PREFIX: &str = "p-";

/// Identifier of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesize an id that does not collide with any of `existing`.
    ///
    /// The base is `p-<unix millis>`; on collision a `-<n>` suffix is added,
    /// counting up from 2 until the id is free. Two calls against the same set
    /// within one millisecond therefore still yield distinct ids once the first
    /// has been inserted.
    ///
    /// ```
    /// use std::collections::HashSet;
    /// use chrono::TimeZone;
    /// use prodigital_core::ProductId;
    ///
    /// let now = chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    /// let mut taken = HashSet::new();
    /// let first = ProductId::generate(&taken, now);
    /// taken.insert(first.clone());
    /// let second = ProductId::generate(&taken, now);
    ///
    /// assert_eq!(first.as_str(), "p-1700000000000");
    /// assert_eq!(second.as_str(), "p-1700000000000-2");
    /// ```
    #[must_use]
    pub fn generate(existing: &HashSet<Self>, now: DateTime<Utc>) -> Self {
        let base = format!("{GENERATED_PREFIX}{}", now.timestamp_millis());
        let candidate = Self(base.clone());
        if !existing.contains(&candidate) {
            return candidate;
        }

        (2_u64..)
            .map(|n| Self(format!("{base}-{n}")))
            .find(|id| !existing.contains(id))
            .unwrap_or(candidate)
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_generate_uses_timestamp() {
        let id = ProductId::generate(&HashSet::new(), at(42));
        assert_eq!(id.as_str(), "p-42");
    }

    #[test]
    fn test_generate_skips_taken_suffixes() {
        let taken: HashSet<ProductId> = ["p-42", "p-42-2", "p-42-3"]
            .into_iter()
            .map(ProductId::from)
            .collect();
        let id = ProductId::generate(&taken, at(42));
        assert_eq!(id.as_str(), "p-42-4");
    }

    #[test]
    fn test_is_blank() {
        assert!(ProductId::new("  ").is_blank());
        assert!(!ProductId::new("a").is_blank());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&ProductId::new("kinsta-review")).unwrap();
        assert_eq!(json, "\"kinsta-review\"");
    }
}

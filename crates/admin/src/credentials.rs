//! Credential pool for the generative-AI endpoint.
//!
//! The operator keeps an ordered list of API keys. Order is fallback priority
//! and blank slots are skipped without comment. Nothing here checks whether a
//! key is well formed; the executor finds out by using it.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

/// Errors from editing the credential list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Slot numbers start at 1 and stop at the list length.
    #[error("no credential slot #{slot} (list has {len})")]
    NoSuchSlot { slot: usize, len: usize },
}

/// One usable credential together with the slot it came from.
///
/// `Debug` never shows the key.
#[derive(Clone)]
pub struct Credential {
    slot: usize,
    secret: SecretString,
}

impl Credential {
    /// Build a credential for `slot` (1-based).
    #[must_use]
    pub fn new(slot: usize, key: impl Into<String>) -> Self {
        Self {
            slot,
            secret: SecretString::from(key.into()),
        }
    }

    /// 1-based position in the configured list, as shown in log messages.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// The raw key, for the request header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Short preview safe to display.
    #[must_use]
    pub fn masked(&self) -> String {
        mask(self.expose())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("slot", &self.slot)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Display row for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub slot: usize,
    pub configured: bool,
    pub preview: String,
}

/// Ordered credential slots, blanks included.
#[derive(Clone, Default)]
pub struct CredentialPool {
    slots: Vec<SecretString>,
}

impl CredentialPool {
    /// Build a pool from the persisted list.
    #[must_use]
    pub fn from_raw(raw: &[String]) -> Self {
        Self {
            slots: raw.iter().map(|k| SecretString::from(k.clone())).collect(),
        }
    }

    /// The list as persisted, blanks included.
    #[must_use]
    pub fn to_raw(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|k| k.expose_secret().to_string())
            .collect()
    }

    /// Number of slots, blank or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Non-blank credentials in declaration order, trimmed.
    #[must_use]
    pub fn active(&self) -> Vec<Credential> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                let key = key.expose_secret().trim();
                (!key.is_empty()).then(|| Credential::new(i + 1, key))
            })
            .collect()
    }

    /// Whether every slot is blank.
    #[must_use]
    pub fn all_blank(&self) -> bool {
        self.slots
            .iter()
            .all(|k| k.expose_secret().trim().is_empty())
    }

    /// Append a slot and return its number.
    pub fn push(&mut self, key: impl Into<String>) -> usize {
        self.slots.push(SecretString::from(key.into()));
        self.slots.len()
    }

    /// Replace the key in `slot`.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchSlot` if `slot` is out of range.
    pub fn set(&mut self, slot: usize, key: impl Into<String>) -> Result<(), CredentialError> {
        let len = self.slots.len();
        let target = slot
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index))
            .ok_or(CredentialError::NoSuchSlot { slot, len })?;
        *target = SecretString::from(key.into());
        Ok(())
    }

    /// Remove `slot`; later slots move up by one.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchSlot` if `slot` is out of range.
    pub fn remove(&mut self, slot: usize) -> Result<(), CredentialError> {
        let index = self.index(slot)?;
        self.slots.remove(index);
        Ok(())
    }

    /// Fill the first blank slot with `key`, or append when none is blank.
    pub fn fill_first_blank(&mut self, key: impl Into<String>) -> usize {
        let key = key.into();
        let blank = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, k)| k.expose_secret().trim().is_empty());
        match blank {
            Some((index, slot)) => {
                *slot = SecretString::from(key);
                index + 1
            }
            None => self.push(key),
        }
    }

    /// Masked previews of every slot.
    #[must_use]
    pub fn masked(&self) -> Vec<SlotSummary> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let key = key.expose_secret().trim();
                SlotSummary {
                    slot: i + 1,
                    configured: !key.is_empty(),
                    preview: mask(key),
                }
            })
            .collect()
    }

    fn index(&self, slot: usize) -> Result<usize, CredentialError> {
        if slot == 0 || slot > self.slots.len() {
            return Err(CredentialError::NoSuchSlot {
                slot,
                len: self.slots.len(),
            });
        }
        Ok(slot - 1)
    }
}

impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("slots", &self.slots.len())
            .field("active", &self.active().len())
            .finish()
    }
}

/// `AIza…c9Qx` for long keys, dots for short ones, empty for blanks.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 8 => "•".repeat(n),
        n => {
            let head: String = chars.iter().take(4).collect();
            let tail: String = chars.iter().skip(n - 4).collect();
            format!("{head}…{tail}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn pool(keys: &[&str]) -> CredentialPool {
        let raw: Vec<String> = keys.iter().map(ToString::to_string).collect();
        CredentialPool::from_raw(&raw)
    }

    #[test]
    fn test_active_skips_blanks_and_keeps_order() {
        let pool = pool(&["", "  ", "first", "", "second"]);
        let active = pool.active();

        assert_eq!(active.len(), 2);
        assert_eq!(active[0].slot(), 3);
        assert_eq!(active[0].expose(), "first");
        assert_eq!(active[1].slot(), 5);
        assert_eq!(active[1].expose(), "second");
    }

    #[test]
    fn test_all_blank() {
        assert!(pool(&["", " "]).all_blank());
        assert!(CredentialPool::default().all_blank());
        assert!(!pool(&["", "k"]).all_blank());
    }

    #[test]
    fn test_set_and_remove() {
        let mut pool = pool(&["a", "b", "c"]);
        pool.set(2, "B").unwrap();
        pool.remove(1).unwrap();

        assert_eq!(pool.to_raw(), vec!["B".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_out_of_range_slot() {
        let mut pool = pool(&["a"]);
        assert_eq!(
            pool.set(0, "x"),
            Err(CredentialError::NoSuchSlot { slot: 0, len: 1 })
        );
        assert_eq!(
            pool.set(2, "x"),
            Err(CredentialError::NoSuchSlot { slot: 2, len: 1 })
        );
        assert_eq!(
            pool.remove(2),
            Err(CredentialError::NoSuchSlot { slot: 2, len: 1 })
        );
        assert_eq!(pool.to_raw(), vec!["a".to_string()]);
    }

    #[test]
    fn test_fill_first_blank() {
        let mut pool = pool(&["a", "", ""]);
        assert_eq!(pool.fill_first_blank("b"), 2);
        assert_eq!(pool.fill_first_blank("c"), 3);
        assert_eq!(pool.fill_first_blank("d"), 4);
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_masked_preview() {
        let pool = pool(&["AIzaSyD-1234567890c9Qx", "short", ""]);
        let rows = pool.masked();

        assert_eq!(rows[0].preview, "AIza…c9Qx");
        assert!(rows[0].configured);
        assert_eq!(rows[1].preview, "•••••");
        assert!(!rows[2].configured);
        assert_eq!(rows[2].preview, "");
    }

    #[test]
    fn test_debug_redacts() {
        let pool = pool(&["AIzaSyD-secret-value"]);
        let credential = &pool.active()[0];

        assert!(!format!("{pool:?}").contains("secret"));
        assert!(!format!("{credential:?}").contains("secret-value"));
    }
}

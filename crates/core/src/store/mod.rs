//! Key-value persistence for site state.
//!
//! The site keeps three JSON snapshots under fixed keys, the same way a
//! browser app would keep them in local storage:
//!
//! | Key               | Contents                 |
//! |-------------------|--------------------------|
//! | `pdr_products`    | `Vec<Product>`           |
//! | `pdr_site_config` | `SiteConfig`             |
//! | `pdr_api_keys`    | `Vec<String>` credentials |
//!
//! There is no schema versioning. A missing or malformed snapshot fails open:
//! [`SiteState::load`] logs a warning and falls back to the defaults (seed
//! catalog, default site configuration, five blank credential slots).

mod file;
mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{Product, SiteConfig, seed_products};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Number of blank credential slots offered on first start.
pub const DEFAULT_CREDENTIAL_SLOTS: usize = 5;

/// Logical names of the stored snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Products,
    SiteConfig,
    ApiKeys,
}

impl StoreKey {
    /// All keys, in load order.
    pub const ALL: [Self; 3] = [Self::Products, Self::SiteConfig, Self::ApiKeys];

    /// Storage name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "pdr_products",
            Self::SiteConfig => "pdr_site_config",
            Self::ApiKeys => "pdr_api_keys",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {key}: {source}")]
    Io {
        /// Key being read or written.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be serialized.
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        /// Key being written.
        key: StoreKey,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// A string key-value store holding JSON snapshots.
///
/// Writes replace the whole value for a key; readers never observe a
/// partially written snapshot.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;

    /// Replace the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError>;
}

/// Everything the site persists.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteState {
    pub products: Vec<Product>,
    pub site_config: SiteConfig,
    /// Raw credential slots, blanks included, in priority order.
    pub credentials: Vec<String>,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            products: seed_products(),
            site_config: SiteConfig::default(),
            credentials: vec![String::new(); DEFAULT_CREDENTIAL_SLOTS],
        }
    }
}

/// The public half of [`SiteState`]: catalog and site configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteContent {
    pub products: Vec<Product>,
    pub site_config: SiteConfig,
}

impl SiteContent {
    /// Load the catalog and site configuration without touching credentials.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            products: load_or(store, StoreKey::Products, seed_products),
            site_config: load_or(store, StoreKey::SiteConfig, SiteConfig::default),
        }
    }
}

impl SiteState {
    /// Load every snapshot, falling back to defaults per key.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let SiteContent {
            products,
            site_config,
        } = SiteContent::load(store);
        Self {
            products,
            site_config,
            credentials: load_or(store, StoreKey::ApiKeys, || {
                vec![String::new(); DEFAULT_CREDENTIAL_SLOTS]
            }),
        }
    }

    /// Persist the catalog and site configuration.
    ///
    /// Snapshots that already hold the same value are not rewritten. If a
    /// write fails, snapshots written earlier in the call are restored, so
    /// the store keeps the content it had before.
    ///
    /// # Errors
    ///
    /// Returns an error if either snapshot cannot be read or written.
    pub fn save_content(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let pending = [
            (StoreKey::Products, encode(StoreKey::Products, &self.products)?),
            (
                StoreKey::SiteConfig,
                encode(StoreKey::SiteConfig, &self.site_config)?,
            ),
        ];

        let mut written: Vec<(StoreKey, Option<String>)> = Vec::with_capacity(pending.len());
        for (key, raw) in &pending {
            let previous = match store.get(*key) {
                Ok(previous) => previous,
                Err(e) => return Err(rollback(store, &written, e)),
            };
            if previous.as_deref() == Some(raw.as_str()) {
                continue;
            }
            if let Err(e) = store.set(*key, raw) {
                return Err(rollback(store, &written, e));
            }
            written.push((*key, previous));
        }
        Ok(())
    }

    /// Persist the credential list.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save_credentials(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        save(store, StoreKey::ApiKeys, &self.credentials)
    }

    /// Persist every snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any snapshot cannot be written.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        self.save_content(store)?;
        self.save_credentials(store)
    }
}

/// Read and decode one snapshot, or build the default.
fn load_or<T, F>(store: &dyn KeyValueStore, key: StoreKey, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Stored snapshot is malformed, using defaults");
            default()
        }),
        Ok(None) => {
            debug!(key = %key, "No stored snapshot, using defaults");
            default()
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read stored snapshot, using defaults");
            default()
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: StoreKey, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialize { key, source })
}

fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: StoreKey,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, &encode(key, value)?)
}

/// Snapshot that loads the same as a key that was never written.
fn default_snapshot(key: StoreKey) -> Result<String, StoreError> {
    match key {
        StoreKey::Products => encode(key, &seed_products()),
        StoreKey::SiteConfig => encode(key, &SiteConfig::default()),
        StoreKey::ApiKeys => encode(key, &vec![String::new(); DEFAULT_CREDENTIAL_SLOTS]),
    }
}

/// Put back the snapshots in `written`, newest first, and hand `cause` back.
fn rollback(
    store: &dyn KeyValueStore,
    written: &[(StoreKey, Option<String>)],
    cause: StoreError,
) -> StoreError {
    for (key, previous) in written.iter().rev() {
        let restored = match previous {
            Some(raw) => store.set(*key, raw),
            None => default_snapshot(*key).and_then(|raw| store.set(*key, &raw)),
        };
        match restored {
            Ok(()) => warn!(key = %key, error = %cause, "Save failed, restored previous snapshot"),
            Err(e) => warn!(key = %key, error = %e, "Failed to restore snapshot after a failed save"),
        }
    }
    cause
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let state = SiteState::load(&store);
        assert_eq!(state, SiteState::default());
        assert_eq!(state.credentials.len(), DEFAULT_CREDENTIAL_SLOTS);
    }

    #[test]
    fn test_malformed_snapshot_fails_open_per_key() {
        let store = MemoryStore::new();
        store.set(StoreKey::Products, "{not json").unwrap();
        store
            .set(StoreKey::ApiKeys, r#"["key-one",""]"#)
            .unwrap();

        let state = SiteState::load(&store);
        assert_eq!(state.products, seed_products());
        assert_eq!(state.credentials, vec!["key-one".to_string(), String::new()]);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut state = SiteState::default();
        state.products.truncate(1);
        state.site_config.hero_headline = "New headline".to_string();
        state.credentials = vec!["abc".to_string()];
        state.save(&store).unwrap();

        assert_eq!(SiteState::load(&store), state);
    }

    #[test]
    fn test_save_content_leaves_credentials_alone() {
        let store = MemoryStore::new();
        store.set(StoreKey::ApiKeys, r#"["keep-me"]"#).unwrap();

        SiteState::default().save_content(&store).unwrap();

        assert_eq!(
            store.get(StoreKey::ApiKeys).unwrap().as_deref(),
            Some(r#"["keep-me"]"#)
        );
    }

    /// Memory store that refuses writes to one key.
    struct FailingStore {
        inner: MemoryStore,
        fail_on: StoreKey,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
            if key == self.fail_on {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn stored_state(products: usize) -> SiteState {
        let mut state = SiteState::default();
        state.products.truncate(products);
        state
    }

    #[test]
    fn test_failed_site_config_write_restores_products() {
        let inner = MemoryStore::new();
        stored_state(2).save(&inner).unwrap();
        let before = inner.get(StoreKey::Products).unwrap();
        let store = FailingStore {
            inner,
            fail_on: StoreKey::SiteConfig,
        };

        let mut next = stored_state(1);
        next.site_config.hero_headline = "Changed".to_string();
        assert!(next.save_content(&store).is_err());

        assert_eq!(store.get(StoreKey::Products).unwrap(), before);
        assert_eq!(SiteState::load(&store), stored_state(2));
    }

    #[test]
    fn test_failed_save_on_empty_store_loads_as_before() {
        let store = FailingStore {
            inner: MemoryStore::new(),
            fail_on: StoreKey::SiteConfig,
        };

        let mut next = stored_state(1);
        next.site_config.hero_headline = "Changed".to_string();
        assert!(next.save_content(&store).is_err());

        assert_eq!(SiteState::load(&store).products, seed_products());
    }

    #[test]
    fn test_unchanged_snapshot_is_not_rewritten() {
        let inner = MemoryStore::new();
        stored_state(2).save(&inner).unwrap();
        let store = FailingStore {
            inner,
            fail_on: StoreKey::SiteConfig,
        };

        stored_state(1).save_content(&store).unwrap();

        assert_eq!(SiteState::load(&store).products.len(), 1);
    }

    /// Memory store that records which keys were read.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        reads: std::sync::Mutex<Vec<StoreKey>>,
    }

    impl KeyValueStore for RecordingStore {
        fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
            self.reads.lock().unwrap().push(key);
            self.inner.get(key)
        }

        fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_content_load_skips_credentials() {
        let store = RecordingStore::default();
        stored_state(2).save(&store.inner).unwrap();

        let content = SiteContent::load(&store);

        assert_eq!(content.products.len(), 2);
        assert_eq!(
            *store.reads.lock().unwrap(),
            [StoreKey::Products, StoreKey::SiteConfig]
        );
    }

    #[test]
    fn test_key_names() {
        let names: Vec<&str> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["pdr_products", "pdr_site_config", "pdr_api_keys"]);
    }
}

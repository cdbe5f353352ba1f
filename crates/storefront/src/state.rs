//! Application state shared across handlers.

use std::sync::Arc;

use prodigital_core::{KeyValueStore, SiteContent};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn KeyValueStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    /// Current catalog and site configuration, read fresh so admin edits
    /// show up immediately. Credentials are never loaded here.
    ///
    /// Unreadable snapshots fall back to defaults.
    #[must_use]
    pub fn content(&self) -> SiteContent {
        SiteContent::load(self.inner.store.as_ref())
    }
}

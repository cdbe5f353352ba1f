//! Application state shared across handlers.

use std::sync::Arc;

use prodigital_core::{FileStore, KeyValueStore};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::config::AdminConfig;
use crate::gemini::{GeminiClient, GeminiError};
use crate::services::{AdminAgent, CompletionBackend};

/// Errors building [`AppState`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to open data directory: {0}")]
    Store(#[from] prodigital_core::StoreError),
    #[error("failed to build Gemini client: {0}")]
    Gemini(#[from] GeminiError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    agent: AdminAgent,
}

impl AppState {
    /// Build state from explicit parts.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        let agent = AdminAgent::new(store, backend, &config.agent);
        Self {
            inner: Arc::new(AppStateInner { config, agent }),
        }
    }

    /// Open the file store, build the Gemini client and seed the
    /// `GEMINI_API_KEY` credential when every slot is blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or HTTP client cannot be set up.
    pub async fn from_config(config: AdminConfig) -> Result<Self, StateError> {
        let store = Arc::new(FileStore::open(&config.data_dir)?);
        let backend = Arc::new(GeminiClient::new(&config.gemini)?);
        let bootstrap_key = config.gemini.bootstrap_key.clone();

        let state = Self::new(config, store, backend);
        if let Some(key) = bootstrap_key
            && let Err(e) = state.agent().seed_credential(key.expose_secret()).await
        {
            warn!(error = %e, "Failed to seed credential from GEMINI_API_KEY");
        }
        Ok(state)
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn agent(&self) -> &AdminAgent {
        &self.inner.agent
    }
}

//! CLI command implementations.

pub mod agent;
pub mod catalog;
pub mod keys;

use prodigital_admin::config::{AdminConfig, ConfigError};
use prodigital_admin::state::{AppState, StateError};
use thiserror::Error;

/// Errors opening the admin state from the environment.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    State(#[from] StateError),
}

/// Load [`AdminConfig`] from the environment.
pub fn load_config() -> Result<AdminConfig, SetupError> {
    Ok(AdminConfig::from_env()?)
}

/// Open the same state the admin panel would.
pub async fn open_state() -> Result<AppState, SetupError> {
    let config = load_config()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Opening site state");
    Ok(AppState::from_config(config).await?)
}

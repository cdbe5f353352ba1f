//! Credential list management.

use prodigital_admin::services::AgentError;
use thiserror::Error;

use super::{SetupError, open_state};

#[derive(Debug, Error)]
pub enum KeysError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Key must not be blank")]
    BlankKey,
}

pub async fn list() -> Result<(), KeysError> {
    let state = open_state().await?;
    let slots = state.agent().credentials().await;
    if slots.is_empty() {
        println!("No API keys configured.");
        return Ok(());
    }
    for slot in slots {
        let preview = if slot.configured {
            slot.preview
        } else {
            "(blank)".to_string()
        };
        println!("#{:<3} {preview}", slot.slot);
    }
    Ok(())
}

pub async fn add(key: &str) -> Result<(), KeysError> {
    let key = non_blank(key)?;
    let state = open_state().await?;
    let slot = state.agent().add_credential(key).await?;
    println!("Added key #{slot}");
    Ok(())
}

pub async fn set(slot: usize, key: &str) -> Result<(), KeysError> {
    let key = non_blank(key)?;
    let state = open_state().await?;
    state.agent().set_credential(slot, key).await?;
    println!("Updated key #{slot}");
    Ok(())
}

pub async fn remove(slot: usize) -> Result<(), KeysError> {
    let state = open_state().await?;
    state.agent().remove_credential(slot).await?;
    println!("Removed key #{slot}");
    Ok(())
}

fn non_blank(key: &str) -> Result<&str, KeysError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KeysError::BlankKey);
    }
    Ok(key)
}

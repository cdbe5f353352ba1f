//! Integration tests for ProDigital Reviews.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p prodigital-integration-tests
//! ```
//!
//! No network access is needed: the Gemini client is replaced by
//! [`ScriptedBackend`], which answers per credential from a script.
//!
//! # Test Categories
//!
//! - `admin_commands` - Command processing through the admin agent
//! - `admin_routes` - Admin HTTP API, PIN gate included
//! - `storefront_catalog` - Public catalog reads against shared state

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use futures::future::BoxFuture;
use prodigital_admin::config::{AdminConfig, AgentSettings};
use prodigital_admin::credentials::Credential;
use prodigital_admin::gemini::GeminiError;
use prodigital_admin::services::{AdminAgent, CompletionBackend, CompletionRequest};
use prodigital_admin::state::AppState;
use prodigital_core::{KeyValueStore, MemoryStore, Product, StoreKey};

/// A key that [`ScriptedBackend`] scripts usually answer on.
pub const TEST_KEY: &str = "AIzaSyTestKey-0001";

// =============================================================================
// Scripted backend
// =============================================================================

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    Empty,
}

/// Completion backend answering from a per-credential script.
///
/// Each key has a queue of replies. A key with nothing queued is rejected
/// the way Gemini rejects an invalid key.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply for `key`.
    #[must_use]
    pub fn reply(self, key: &str, text: &str) -> Self {
        self.push(key, Reply::Text(text.to_string()))
    }

    /// Queue a failure for `key`.
    #[must_use]
    pub fn fail(self, key: &str, message: &str) -> Self {
        self.push(key, Reply::Fail(message.to_string()))
    }

    /// Queue an empty completion for `key`.
    #[must_use]
    pub fn empty(self, key: &str) -> Self {
        self.push(key, Reply::Empty)
    }

    /// Sleep before every reply.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keys used so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if a previous call panicked while recording.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn push(self, key: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
        self
    }
}

impl CompletionBackend for ScriptedBackend {
    fn complete<'a>(
        &'a self,
        credential: &'a Credential,
        _request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, GeminiError>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let key = credential.expose().to_string();
            self.calls.lock().expect("calls lock").push(key.clone());
            let next = self
                .replies
                .lock()
                .expect("replies lock")
                .get_mut(&key)
                .and_then(VecDeque::pop_front);

            match next {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Empty) => Ok(String::new()),
                Some(Reply::Fail(message)) => Err(GeminiError::Api {
                    status: "INTERNAL".to_string(),
                    message,
                }),
                None => Err(GeminiError::Unauthorized("API key not valid".to_string())),
            }
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Build a catalog entry with the given rating and placeholder display text.
///
/// # Panics
///
/// Panics if `rating` is outside `0.0..=5.0`.
#[must_use]
pub fn product(id: &str, name: &str, rating: f64) -> Product {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "category": "Testing",
        "rating": rating,
        "reviewCount": 12,
        "shortDescription": format!("{name} in one line"),
        "pros": ["Fast"],
        "cons": ["Pricey"],
        "verdict": "Solid",
    }))
    .expect("valid product fixture")
}

/// A memory store holding `products` and the credential list `keys`.
///
/// # Panics
///
/// Panics if the fixture cannot be serialized.
#[must_use]
pub fn store_with(products: &[Product], keys: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            StoreKey::Products,
            &serde_json::to_string(products).expect("serialize products"),
        )
        .expect("write products");
    store
        .set(
            StoreKey::ApiKeys,
            &serde_json::to_string(keys).expect("serialize keys"),
        )
        .expect("write keys");
    store
}

/// An agent with default settings over `store`.
#[must_use]
pub fn agent(store: Arc<MemoryStore>, backend: Arc<ScriptedBackend>) -> AdminAgent {
    AdminAgent::new(store, backend, &AgentSettings::default())
}

/// The admin application over `store`, sessions included.
#[must_use]
pub fn admin_app(store: Arc<MemoryStore>, backend: Arc<ScriptedBackend>) -> Router {
    let config = AdminConfig::local("target/test-data");
    prodigital_admin::routes::app(AppState::new(config, store, backend))
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

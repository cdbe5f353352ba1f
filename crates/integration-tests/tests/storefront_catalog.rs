//! Integration tests for the public storefront.
//!
//! The storefront reads the same store the admin agent writes, so these also
//! check that admin edits show up without a restart.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use prodigital_admin::config::AgentSettings;
use prodigital_admin::services::AdminAgent;
use prodigital_core::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreKey};
use prodigital_integration_tests::{
    ScriptedBackend, TEST_KEY, agent, body_json, product, store_with,
};
use prodigital_storefront::routes;
use prodigital_storefront::state::AppState;
use tower::ServiceExt;

fn storefront(store: Arc<dyn KeyValueStore>) -> Router {
    routes::app(AppState::new(store))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_empty_store_serves_seed_catalog() {
    let app = storefront(Arc::new(MemoryStore::new()));

    let (status, products) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!products.as_array().unwrap().is_empty());

    let (_, site) = get(&app, "/api/site").await;
    assert_eq!(site["siteTitle"], "ProDigital Reviews");
    assert_eq!(site["contactEmail"], "contact@prodigitalreviews.com");
}

#[tokio::test]
async fn test_corrupt_snapshot_falls_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.set(StoreKey::Products, "{not json").unwrap();
    let app = storefront(store);

    let (status, products) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products[0]["id"], "semrush-review");
}

#[tokio::test]
async fn test_category_filter_is_case_insensitive() {
    let app = storefront(Arc::new(MemoryStore::new()));

    let (_, hosting) = get(&app, "/api/products?category=web%20hosting").await;
    let hosting = hosting.as_array().unwrap();
    assert!(!hosting.is_empty());
    assert!(hosting.iter().all(|p| p["category"] == "Web Hosting"));

    let (_, all) = get(&app, "/api/products?category=").await;
    let (_, unfiltered) = get(&app, "/api/products").await;
    assert_eq!(all, unfiltered);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = storefront(Arc::new(MemoryStore::new()));

    let (status, body) = get(&app, "/api/products/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_admin_edits_are_visible_immediately() {
    let store = store_with(&[product("a", "Alpha Tool", 4.0)], &[TEST_KEY]);
    let backend = Arc::new(ScriptedBackend::new().reply(
        TEST_KEY,
        r#"{"action":"update","id":"a","changes":{"name":"Alpha Pro"}}"#,
    ));
    let admin = agent(store.clone(), backend);
    let app = storefront(store);

    let (_, before) = get(&app, "/api/products/a").await;
    assert_eq!(before["name"], "Alpha Tool");

    admin.process_command("rename a to Alpha Pro").await.unwrap();

    let (_, after) = get(&app, "/api/products/a").await;
    assert_eq!(after["name"], "Alpha Pro");
    assert_eq!(after["rating"], 4.0);
}

#[tokio::test]
async fn test_shared_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    let admin_store = Arc::new(FileStore::open(dir.path()).unwrap());
    let backend = Arc::new(ScriptedBackend::new().reply(
        TEST_KEY,
        r#"{"action":"delete","id":"semrush-review"}"#,
    ));
    let admin = AdminAgent::new(admin_store, backend, &AgentSettings::default());
    admin.add_credential(TEST_KEY).await.unwrap();

    let app = storefront(Arc::new(FileStore::open(dir.path()).unwrap()));
    let (status, _) = get(&app, "/api/products/semrush-review").await;
    assert_eq!(status, StatusCode::OK);

    admin.process_command("drop semrush").await.unwrap();

    let (status, _) = get(&app, "/api/products/semrush-review").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_credentials_never_leave_the_storefront() {
    let store = store_with(&[product("a", "Alpha Tool", 4.0)], &[TEST_KEY]);
    let app = storefront(store);

    for uri in ["/api/site", "/api/products", "/api/products/a"] {
        let (_, body) = get(&app, uri).await;
        assert!(!body.to_string().contains(TEST_KEY), "{uri} leaked a key");
    }
}

/// Store that counts credential reads.
struct CredentialReads {
    inner: Arc<MemoryStore>,
    reads: AtomicUsize,
}

impl KeyValueStore for CredentialReads {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        if key == StoreKey::ApiKeys {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.get(key)
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }
}

#[tokio::test]
async fn test_public_routes_never_read_credentials() {
    let store = Arc::new(CredentialReads {
        inner: store_with(&[product("a", "Alpha Tool", 4.0)], &[TEST_KEY]),
        reads: AtomicUsize::new(0),
    });
    let app = storefront(store.clone());

    for uri in ["/api/site", "/api/products", "/api/products/a"] {
        let (status, _) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
    assert_eq!(store.reads.load(Ordering::SeqCst), 0);
}

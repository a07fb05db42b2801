//! Client directory behavior over the in-memory backend.

use std::sync::Arc;

use oauth2_store::{ClientRecord, ClientStorage, OAuthStore};
use oauth2_store_core::{ClientConfig, TokenConfig};
use oauth2_store_memory::InMemoryBackend;

async fn open() -> (Arc<InMemoryBackend>, OAuthStore) {
    let backend = Arc::new(InMemoryBackend::new());
    let store = OAuthStore::open(
        backend.clone(),
        ClientConfig::default(),
        TokenConfig::default(),
    )
    .await
    .unwrap();
    (backend, store)
}

#[tokio::test]
async fn test_client_lifecycle_through_trait_object() {
    let (backend, store) = open().await;
    let clients: &dyn ClientStorage = store.clients();
    let client = ClientRecord::new("app", "s3cret", "https://app.example", "alice");

    clients.set(&client).await.unwrap();
    assert_eq!(clients.get_by_id("app").await.unwrap(), client);
    assert!(backend.contains("oauth2_clients", "app").await);

    clients.remove_by_id("app").await.unwrap();
    assert!(clients.get_by_id("app").await.unwrap_err().is_not_found());
    assert!(clients.remove_by_id("app").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_clients_never_expire() {
    let (backend, store) = open().await;
    let client = ClientRecord::new("app", "s3cret", "https://app.example", "alice");
    store.clients().set(&client).await.unwrap();

    assert_eq!(backend.purge_expired().await, 0);
    assert_eq!(store.clients().get_by_id("app").await.unwrap(), client);
}

#[tokio::test]
async fn test_client_insert_failure_is_unavailable() {
    let (backend, store) = open().await;
    backend.faults().fail_inserts_into("oauth2_clients");

    let client = ClientRecord::new("app", "s3cret", "https://app.example", "alice");
    let err = store.clients().set(&client).await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(backend.is_empty("oauth2_clients").await);
}

#[tokio::test]
async fn test_new_skips_table_creation() {
    let backend = Arc::new(InMemoryBackend::new());
    let store = OAuthStore::new(
        backend.clone(),
        ClientConfig::default(),
        TokenConfig::default(),
    )
    .unwrap();

    assert!(backend.is_empty("oauth2_clients").await);
    let client = ClientRecord::new("app", "s3cret", "https://app.example", "alice");
    store.clients().set(&client).await.unwrap();
    assert_eq!(backend.len("oauth2_clients").await, 1);
}

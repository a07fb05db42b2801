//! Token store behavior over the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use oauth2_store::{OAuthStore, TokenStorage, TokenStore};
use oauth2_store_core::{
    BasicGrantRecord, ClientConfig, IssuedToken, SequenceIdGenerator, StoreBackend, TokenConfig,
    TokenGrant,
};
use oauth2_store_memory::InMemoryBackend;
use time::OffsetDateTime;

const BASIC: &str = "oauth2_basic";
const ACCESS: &str = "oauth2_access";
const REFRESH: &str = "oauth2_refresh";

async fn setup() -> (Arc<InMemoryBackend>, TokenStore) {
    let backend = Arc::new(InMemoryBackend::new());
    let store = TokenStore::open(backend.clone(), TokenConfig::default())
        .await
        .unwrap();
    (backend, store)
}

fn issued(value: &str, issued_at: OffsetDateTime, secs: u64) -> IssuedToken {
    IssuedToken::new(value, issued_at, Duration::from_secs(secs))
}

fn token_grant(access: &str, refresh: Option<&str>) -> TokenGrant {
    let now = OffsetDateTime::now_utc();
    let mut grant = TokenGrant::new("app")
        .with_user("alice")
        .with_scope("read write")
        .with_access(issued(access, now, 3600));
    if let Some(refresh) = refresh {
        grant = grant.with_refresh(issued(refresh, now, 7200));
    }
    grant
}

async fn basic_record(backend: &InMemoryBackend, id: &str) -> BasicGrantRecord {
    backend.find_basic(BASIC, id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_code_grant_round_trip() {
    let (backend, store) = setup().await;
    let grant = TokenGrant::new("app")
        .with_user("alice")
        .with_redirect_uri("https://app.example/cb")
        .with_code(issued("code-1", OffsetDateTime::now_utc(), 600));

    store.create(&grant).await.unwrap();

    assert_eq!(backend.len(BASIC).await, 1);
    assert!(backend.is_empty(ACCESS).await);
    assert!(backend.is_empty(REFRESH).await);
    assert_eq!(store.get_by_code("code-1").await.unwrap(), Some(grant));
}

#[tokio::test]
async fn test_code_takes_precedence_over_tokens() {
    let (backend, store) = setup().await;
    let now = OffsetDateTime::now_utc();
    let grant = TokenGrant::new("app")
        .with_code(issued("code-1", now, 600))
        .with_access(issued("acc-1", now, 3600));

    store.create(&grant).await.unwrap();

    assert!(backend.contains(BASIC, "code-1").await);
    assert!(backend.is_empty(ACCESS).await);
    assert_eq!(store.get_by_access("acc-1").await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_code_is_absent() {
    let (_, store) = setup().await;
    let issued_at = OffsetDateTime::now_utc() - time::Duration::hours(1);
    let grant = TokenGrant::new("app").with_code(issued("old-code", issued_at, 600));

    store.create(&grant).await.unwrap();

    assert_eq!(store.get_by_code("old-code").await.unwrap(), None);
}

#[tokio::test]
async fn test_duplicate_code_rejected() {
    let (_, store) = setup().await;
    let grant = TokenGrant::new("app").with_code(issued("code-1", OffsetDateTime::now_utc(), 600));

    store.create(&grant).await.unwrap();
    let err = store.create(&grant).await.unwrap_err();
    assert!(err.is_duplicate_key());
}

#[tokio::test]
async fn test_access_and_refresh_resolve_same_grant() {
    let (backend, store) = setup().await;
    let grant = token_grant("acc-1", Some("ref-1"));

    store.create(&grant).await.unwrap();

    assert_eq!(backend.len(BASIC).await, 1);
    assert_eq!(backend.len(ACCESS).await, 1);
    assert_eq!(backend.len(REFRESH).await, 1);

    let by_access = store.get_by_access("acc-1").await.unwrap();
    let by_refresh = store.get_by_refresh("ref-1").await.unwrap();
    assert_eq!(by_access, Some(grant.clone()));
    assert_eq!(by_refresh, Some(grant));
}

#[tokio::test]
async fn test_record_expiries_follow_lifetimes() {
    let (backend, store) = setup().await;
    let store = store.with_id_generator(Arc::new(SequenceIdGenerator::new(["grant-1"])));
    let now = OffsetDateTime::now_utc();
    let grant = TokenGrant::new("app")
        .with_access(issued("acc-1", now, 3600))
        .with_refresh(issued("ref-1", now, 7200));

    store.create(&grant).await.unwrap();

    let basic = basic_record(&backend, "grant-1").await;
    let access = backend.find_index(ACCESS, "acc-1").await.unwrap().unwrap();
    let refresh = backend.find_index(REFRESH, "ref-1").await.unwrap().unwrap();

    assert_eq!(access.basic_id, "grant-1");
    assert_eq!(refresh.basic_id, "grant-1");
    assert_eq!(access.expires_at, now + time::Duration::seconds(3600));
    assert_eq!(refresh.expires_at, now + time::Duration::seconds(7200));
    assert_eq!(basic.expires_at, refresh.expires_at);
}

#[tokio::test]
async fn test_access_expiry_capped_by_refresh() {
    let (backend, store) = setup().await;
    let store = store.with_id_generator(Arc::new(SequenceIdGenerator::new(["grant-1"])));
    let now = OffsetDateTime::now_utc();
    let grant = TokenGrant::new("app")
        .with_access(issued("acc-1", now, 7200))
        .with_refresh(issued("ref-1", now, 3600));

    store.create(&grant).await.unwrap();

    let access = backend.find_index(ACCESS, "acc-1").await.unwrap().unwrap();
    let basic = basic_record(&backend, "grant-1").await;
    assert_eq!(access.expires_at, now + time::Duration::seconds(3600));
    assert_eq!(basic.expires_at, access.expires_at);
}

#[tokio::test]
async fn test_access_only_grant() {
    let (backend, store) = setup().await;
    let grant = token_grant("acc-1", None);

    store.create(&grant).await.unwrap();

    assert_eq!(backend.len(BASIC).await, 1);
    assert_eq!(backend.len(ACCESS).await, 1);
    assert!(backend.is_empty(REFRESH).await);
    assert_eq!(store.get_by_access("acc-1").await.unwrap(), Some(grant));
}

#[tokio::test]
async fn test_access_expires_while_refresh_resolves() {
    let (backend, store) = setup().await;
    let grant = token_grant("acc-1", Some("ref-1"));
    store.create(&grant).await.unwrap();

    let past = OffsetDateTime::now_utc() - time::Duration::seconds(1);
    assert!(backend.set_expiry(ACCESS, "acc-1", past).await);

    assert_eq!(store.get_by_access("acc-1").await.unwrap(), None);
    assert_eq!(store.get_by_refresh("ref-1").await.unwrap(), Some(grant));

    assert_eq!(backend.purge_expired().await, 1);
    assert!(!backend.contains(ACCESS, "acc-1").await);
}

#[tokio::test]
async fn test_index_without_grant_resolves_to_none() {
    let (backend, store) = setup().await;
    let store = store.with_id_generator(Arc::new(SequenceIdGenerator::new(["grant-1"])));
    store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap();

    assert_eq!(backend.delete_by_id(BASIC, "grant-1").await.unwrap(), 1);

    assert_eq!(store.get_by_access("acc-1").await.unwrap(), None);
    assert_eq!(store.get_by_refresh("ref-1").await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_tokens_are_absent() {
    let (_, store) = setup().await;
    assert_eq!(store.get_by_code("nope").await.unwrap(), None);
    assert_eq!(store.get_by_access("nope").await.unwrap(), None);
    assert_eq!(store.get_by_refresh("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_failed_index_insert_writes_nothing() {
    let (backend, store) = setup().await;
    backend.faults().fail_inserts_into(ACCESS);

    let err = store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap_err();

    assert!(err.is_unavailable());
    assert!(backend.is_empty(BASIC).await);
    assert!(backend.is_empty(ACCESS).await);
    assert!(backend.is_empty(REFRESH).await);
}

#[tokio::test]
async fn test_failed_commit_aborts_and_retry_succeeds() {
    let (backend, store) = setup().await;
    let grant = token_grant("acc-1", Some("ref-1"));
    backend.faults().fail_commit();

    let err = store.create(&grant).await.unwrap_err();
    assert!(err.is_transaction_aborted());
    assert!(backend.is_empty(BASIC).await);

    backend.faults().clear();
    store.create(&grant).await.unwrap();
    assert_eq!(store.get_by_refresh("ref-1").await.unwrap(), Some(grant));
}

#[tokio::test]
async fn test_surrogate_collision_aborts_whole_issuance() {
    let (backend, store) = setup().await;
    let store = store.with_id_generator(Arc::new(SequenceIdGenerator::new([
        "grant-1", "grant-1", "grant-2",
    ])));

    store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap();

    let second = token_grant("acc-2", Some("ref-2"));
    let err = store.create(&second).await.unwrap_err();
    assert!(err.is_transaction_aborted());
    assert!(!backend.contains(ACCESS, "acc-2").await);
    assert!(!backend.contains(REFRESH, "ref-2").await);

    store.create(&second).await.unwrap();
    assert_eq!(store.get_by_access("acc-2").await.unwrap(), Some(second));
    assert_eq!(backend.len(BASIC).await, 2);
}

#[tokio::test]
async fn test_duplicate_access_token_aborts() {
    let (backend, store) = setup().await;
    store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap();

    let err = store
        .create(&token_grant("acc-1", Some("ref-2")))
        .await
        .unwrap_err();

    assert!(err.is_transaction_aborted());
    assert_eq!(backend.len(BASIC).await, 1);
    assert!(!backend.contains(REFRESH, "ref-2").await);
}

#[tokio::test]
async fn test_revoke_refresh_is_idempotent() {
    let (backend, store) = setup().await;
    let grant = token_grant("acc-1", Some("ref-1"));
    store.create(&grant).await.unwrap();

    store.remove_by_refresh("ref-1").await.unwrap();
    store.remove_by_refresh("ref-1").await.unwrap();

    assert_eq!(store.get_by_refresh("ref-1").await.unwrap(), None);
    assert_eq!(store.get_by_access("acc-1").await.unwrap(), Some(grant));
    assert_eq!(backend.len(BASIC).await, 1);
}

#[tokio::test]
async fn test_revoke_access_keeps_refresh() {
    let (_, store) = setup().await;
    let grant = token_grant("acc-1", Some("ref-1"));
    store.create(&grant).await.unwrap();

    store.remove_by_access("acc-1").await.unwrap();

    assert_eq!(store.get_by_access("acc-1").await.unwrap(), None);
    assert_eq!(store.get_by_refresh("ref-1").await.unwrap(), Some(grant));
    store.remove_by_access("never-issued").await.unwrap();
}

#[tokio::test]
async fn test_remove_code() {
    let (_, store) = setup().await;
    let grant = TokenGrant::new("app").with_code(issued("code-1", OffsetDateTime::now_utc(), 600));
    store.create(&grant).await.unwrap();

    store.remove_by_code("code-1").await.unwrap();
    assert_eq!(store.get_by_code("code-1").await.unwrap(), None);

    let err = store.remove_by_code("code-1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_remove_expired_code_is_not_found() {
    let (backend, store) = setup().await;
    let grant = TokenGrant::new("app").with_code(issued("code-1", OffsetDateTime::now_utc(), 600));
    store.create(&grant).await.unwrap();
    let past = OffsetDateTime::now_utc() - time::Duration::seconds(1);
    assert!(backend.set_expiry(BASIC, "code-1", past).await);

    let err = store.remove_by_code("code-1").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!backend.contains(BASIC, "code-1").await);
}

#[tokio::test]
async fn test_corrupt_payload_is_decode_failure() {
    let (backend, store) = setup().await;
    let record = BasicGrantRecord {
        id: "code-1".to_string(),
        data: b"not a grant".to_vec(),
        expires_at: OffsetDateTime::now_utc() + time::Duration::minutes(10),
    };
    backend.insert_basic(BASIC, &record).await.unwrap();

    let err = store.get_by_code("code-1").await.unwrap_err();
    assert!(err.is_decode_failure());
}

#[tokio::test]
async fn test_grant_without_code_or_access_rejected() {
    let (backend, store) = setup().await;
    let grant = TokenGrant::new("app")
        .with_refresh(issued("ref-1", OffsetDateTime::now_utc(), 7200));

    let err = store.create(&grant).await.unwrap_err();
    assert!(err.is_invalid_grant());
    assert!(backend.is_empty(BASIC).await);
    assert!(backend.is_empty(REFRESH).await);
}

#[tokio::test]
async fn test_custom_table_names() {
    let backend = Arc::new(InMemoryBackend::new());
    let config = TokenConfig::default()
        .with_basic_table("grants")
        .with_access_table("access_tokens")
        .with_refresh_table("refresh_tokens");
    let store = TokenStore::open(backend.clone(), config).await.unwrap();

    store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap();

    assert_eq!(backend.len("grants").await, 1);
    assert!(backend.contains("access_tokens", "acc-1").await);
    assert!(backend.contains("refresh_tokens", "ref-1").await);
}

#[tokio::test]
async fn test_concurrent_issuance() {
    let (backend, store) = setup().await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create(&token_grant(&format!("acc-{i}"), Some(&format!("ref-{i}"))))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(backend.len(BASIC).await, 16);
    assert_eq!(backend.len(ACCESS).await, 16);
    assert_eq!(backend.len(REFRESH).await, 16);
    for i in 0..16 {
        let grant = store.get_by_refresh(&format!("ref-{i}")).await.unwrap();
        assert_eq!(grant.unwrap().access.unwrap().value, format!("acc-{i}"));
    }
}

#[tokio::test]
async fn test_store_usable_through_trait_object() {
    let backend = Arc::new(InMemoryBackend::new());
    let store = OAuthStore::open(backend, ClientConfig::default(), TokenConfig::default())
        .await
        .unwrap();
    let tokens: &dyn TokenStorage = store.tokens();

    let grant = token_grant("acc-1", None);
    tokens.create(&grant).await.unwrap();
    assert_eq!(tokens.get_by_access("acc-1").await.unwrap(), Some(grant));
    tokens.remove_by_access("acc-1").await.unwrap();
    assert_eq!(tokens.get_by_access("acc-1").await.unwrap(), None);

    store.close().await;
}

#[tokio::test]
async fn test_closed_backend_is_unavailable() {
    let (_, store) = setup().await;
    store.close().await;

    let err = store.get_by_access("acc-1").await.unwrap_err();
    assert!(err.is_unavailable());
    let err = store
        .create(&token_grant("acc-1", Some("ref-1")))
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
}

use std::sync::Arc;

use nskv_client::{ClientError, KVClient};
use nskv_common::StoreConfig;
use nskv_core::Store;
use nskv_server::metrics::Metrics;
use nskv_server::{build_router, AppState};
use tempfile::TempDir;

async fn spawn_server() -> (String, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let mut config = StoreConfig::default();
    config.log_file = dir.path().join("wal.log");
    let store = Store::open(config).await.expect("open store");
    let state = AppState {
        store,
        metrics: Arc::new(Metrics::new()),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("http://{addr}"), dir)
}

#[tokio::test]
async fn client_set_get_roundtrip() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    client.set("", "key", "value", None).await.expect("set");
    let value = client.get("", "key").await.expect("get");
    assert_eq!(value, "value");
}

#[tokio::test]
async fn client_get_missing_key_is_not_found() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    let err = client.get("", "missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
}

#[tokio::test]
async fn client_delete_then_get_is_not_found() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    client.set("", "key", "value", None).await.expect("set");
    client.delete("", "key").await.expect("delete");
    let err = client.get("", "key").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
}

#[tokio::test]
async fn client_namespace_operations() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    client.set("t1", "k", "a", None).await.expect("set t1");
    client.set("t2", "k", "b", None).await.expect("set t2");

    assert_eq!(client.namespace_size("t1").await.unwrap(), 1);
    let namespaces = client.list_namespaces().await.unwrap();
    assert!(namespaces.contains(&"t1".to_string()));
    assert!(namespaces.contains(&"t2".to_string()));

    let deleted = client.clear_namespace("t1").await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(client.namespace_size("t1").await.unwrap(), 0);
}

#[tokio::test]
async fn client_stats_and_health_and_compact() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    client.set("", "k", "v", None).await.expect("set");

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.store_size, 1);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_keys, 1);

    client.compact().await.expect("compact");

    let performance = client.performance().await.unwrap();
    assert!(performance.total_operations > 0);
}

#[tokio::test]
async fn client_set_rejects_invalid_ttl() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    let err = client.set("", "k", "v", Some(-1)).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn client_roundtrip_with_special_characters_in_key_and_namespace() {
    let (base_url, _dir) = spawn_server().await;
    let client = KVClient::new(base_url);

    client
        .set("ns/with space&odd#chars", "a/b?c", "value", None)
        .await
        .expect("set");
    let value = client
        .get("ns/with space&odd#chars", "a/b?c")
        .await
        .expect("get");
    assert_eq!(value, "value");

    assert_eq!(
        client
            .namespace_size("ns/with space&odd#chars")
            .await
            .unwrap(),
        1
    );
    client
        .delete("ns/with space&odd#chars", "a/b?c")
        .await
        .expect("delete");
    let err = client
        .get("ns/with space&odd#chars", "a/b?c")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
}

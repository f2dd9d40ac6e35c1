//! Integration Tests for API Endpoints
//!
//! Runs the caching proxy router against a real local origin server and
//! checks the full request/response cycle for each endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use ttl_proxy_cache::{create_router, AppState, CacheConfig, CachingProxy, HttpAccessor};

// == Fake Origin ==

#[derive(Default)]
struct Origin {
    files: Mutex<HashMap<String, String>>,
    gets: AtomicUsize,
}

impl Origin {
    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

async fn origin_get(
    State(origin): State<Arc<Origin>>,
    Path(key): Path<String>,
) -> Result<String, StatusCode> {
    origin.gets.fetch_add(1, Ordering::SeqCst);
    if key == "slow" {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    let files = origin.files.lock().unwrap();
    files.get(&key).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn origin_put(
    State(origin): State<Arc<Origin>>,
    Path(key): Path<String>,
    body: String,
) -> StatusCode {
    origin.files.lock().unwrap().insert(key, body);
    StatusCode::NO_CONTENT
}

async fn spawn_origin(files: &[(&str, &str)]) -> (String, Arc<Origin>) {
    let origin = Arc::new(Origin::default());
    {
        let mut stored = origin.files.lock().unwrap();
        for (key, value) in files {
            stored.insert(key.to_string(), value.to_string());
        }
    }

    let app = Router::new()
        .route("/:key", get(origin_get).put(origin_put))
        .with_state(Arc::clone(&origin));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), origin)
}

// == Helper Functions ==

async fn create_test_app(files: &[(&str, &str)], ttl: Duration) -> (Router, Arc<Origin>) {
    let (base_url, origin) = spawn_origin(files).await;
    // Talk to the local origin directly even if a system proxy is configured
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let accessor = HttpAccessor::with_client(client, base_url);
    let proxy = CachingProxy::new(&CacheConfig::new(ttl), accessor).unwrap();
    let state = AppState::new(proxy, Duration::from_millis(200));
    (create_router(state), origin)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// == Read Endpoint Tests ==

#[tokio::test]
async fn test_read_miss_then_hit() {
    let (app, origin) = create_test_app(&[("a.txt", "alpha")], Duration::from_secs(60)).await;

    let (status, json) = send(&app, "GET", "/resource/a.txt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "a.txt");
    assert_eq!(json["value"], "alpha");

    let (status, json) = send(&app, "GET", "/resource/a.txt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "alpha");
    assert_eq!(origin.gets(), 1, "Second read should be served from cache");

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["per_key"]["a.txt"]["hits"], 1);
}

#[tokio::test]
async fn test_read_not_found_is_not_cached() {
    let (app, origin) = create_test_app(&[], Duration::from_secs(60)).await;

    let (status, json) = send(&app, "GET", "/resource/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("404"));

    send(&app, "GET", "/resource/missing", None).await;
    assert_eq!(origin.gets(), 2, "Failed fetches must not be cached");

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["misses"], 2);
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn test_reserved_characters_in_key_reach_origin_unchanged() {
    let (app, origin) = create_test_app(
        &[("a", "wrong"), ("a#b", "hash"), ("a?b", "query")],
        Duration::from_secs(60),
    )
    .await;

    let (status, json) = send(&app, "GET", "/resource/a%23b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "a#b");
    assert_eq!(json["value"], "hash");

    let (status, json) = send(&app, "GET", "/resource/a%3Fb", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "a?b");
    assert_eq!(json["value"], "query");

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert!(stats["per_key"].get("a").is_none());
    assert_eq!(origin.gets(), 2);
}

#[tokio::test]
async fn test_write_with_reserved_characters_targets_same_resource() {
    let (app, origin) = create_test_app(&[("a", "untouched")], Duration::from_secs(60)).await;

    let (status, _) = send(&app, "PUT", "/resource/a%23b", Some(r#"{"value":"new"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let files = origin.files.lock().unwrap();
    assert_eq!(files.get("a#b").map(String::as_str), Some("new"));
    assert_eq!(files.get("a").map(String::as_str), Some("untouched"));
}

#[tokio::test]
async fn test_slow_origin_times_out() {
    let (app, _origin) = create_test_app(&[("slow", "eventually")], Duration::from_secs(60)).await;

    let (status, json) = send(&app, "GET", "/resource/slow", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json.get("error").is_some());

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let (app, origin) = create_test_app(&[("a.txt", "alpha")], Duration::from_millis(100)).await;

    send(&app, "GET", "/resource/a.txt", None).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let (status, _) = send(&app, "GET", "/resource/a.txt", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(origin.gets(), 2, "Expired entry should be fetched again");
}

// == Write Endpoint Tests ==

#[tokio::test]
async fn test_write_invalidates_cached_copy() {
    let (app, origin) = create_test_app(&[("a.txt", "old")], Duration::from_secs(60)).await;

    let (_, json) = send(&app, "GET", "/resource/a.txt", None).await;
    assert_eq!(json["value"], "old");

    let (status, json) = send(&app, "PUT", "/resource/a.txt", Some(r#"{"value":"new"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("a.txt"));

    let (_, json) = send(&app, "GET", "/resource/a.txt", None).await;
    assert_eq!(json["value"], "new", "Read after write must not be stale");
    assert_eq!(origin.gets(), 2);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let (app, _origin) = create_test_app(&[], Duration::from_secs(60)).await;

    let (status, _) = send(&app, "PUT", "/resource/a.txt", Some("not json")).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_invalid_key_request() {
    let (app, origin) = create_test_app(&[], Duration::from_secs(60)).await;

    let long_key = "k".repeat(300);
    let (status, json) = send(&app, "GET", &format!("/resource/{}", long_key), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("maximum length"));
    assert_eq!(origin.gets(), 0);
}

// == Invalidation Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_single_key() {
    let (app, origin) = create_test_app(&[("a.txt", "alpha")], Duration::from_secs(60)).await;
    send(&app, "GET", "/resource/a.txt", None).await;

    let (status, json) = send(&app, "DELETE", "/cache/a.txt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["invalidated"], true);

    let (_, json) = send(&app, "DELETE", "/cache/a.txt", None).await;
    assert_eq!(json["invalidated"], false);

    send(&app, "GET", "/resource/a.txt", None).await;
    assert_eq!(origin.gets(), 2);
}

#[tokio::test]
async fn test_clear_cache() {
    let (app, _origin) =
        create_test_app(&[("a", "1"), ("b", "2")], Duration::from_secs(60)).await;
    send(&app, "GET", "/resource/a", None).await;
    send(&app, "GET", "/resource/b", None).await;

    let (status, _) = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 0);
}

// == Stats and Health Tests ==

#[tokio::test]
async fn test_reset_stats() {
    let (app, _origin) = create_test_app(&[("a.txt", "alpha")], Duration::from_secs(60)).await;
    send(&app, "GET", "/resource/a.txt", None).await;
    send(&app, "GET", "/resource/a.txt", None).await;

    let (status, _) = send(&app, "DELETE", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["hits"], 0);
    assert_eq!(stats["misses"], 0);
    assert_eq!(stats["hit_rate"], 0.0);
    assert_eq!(stats["total_entries"], 1, "Reset leaves cached entries alone");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _origin) = create_test_app(&[], Duration::from_secs(60)).await;

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

//! Integration Tests for Admin API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use adaptive_cache::{
    api::create_router,
    cache::{AdaptiveCache, CacheRegistry},
    config::CacheConfig,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let mut registry = CacheRegistry::new();
    registry
        .register(AdaptiveCache::new("api", CacheConfig::api()).unwrap())
        .unwrap();
    registry
        .register(
            AdaptiveCache::new(
                "health",
                CacheConfig::health().with_critical_keys(["health:db"]),
            )
            .unwrap(),
        )
        .unwrap();
    create_router(AppState::new(registry))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn set_request(cache: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/caches/{}/set", cache))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

// == SET / GET ==

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(set_request("api", r#"{"key":"status","value":{"status":"ok"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("status"));

    let response = app
        .oneshot(request("GET", "/caches/api/get/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "status");
    assert_eq!(json["value"]["status"], "ok");
}

#[tokio::test]
async fn test_set_empty_key_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(set_request("api", r#"{"key":"","value":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_get_missing_key() {
    let app = create_test_app();

    let response = app
        .oneshot(request("GET", "/caches/api/get/nothing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE / INVALIDATE ==

#[tokio::test]
async fn test_delete_reports_removed_count() {
    let app = create_test_app();
    app.clone()
        .oneshot(set_request("api", r#"{"key":"k","value":1}"#))
        .await
        .unwrap();

    let first = app.clone().oneshot(request("DELETE", "/caches/api/del/k")).await.unwrap();
    let first = body_to_json(first.into_body()).await;
    let second = app.oneshot(request("DELETE", "/caches/api/del/k")).await.unwrap();
    let second = body_to_json(second.into_body()).await;

    assert_eq!(first["removed"], 1);
    assert_eq!(second["removed"], 0);
}

#[tokio::test]
async fn test_invalidate_endpoint() {
    let app = create_test_app();
    for body in [
        r#"{"key":"user:42:profile","value":1}"#,
        r#"{"key":"user:42:orders","value":2}"#,
        r#"{"key":"user:7:profile","value":3}"#,
    ] {
        app.clone().oneshot(set_request("api", body)).await.unwrap();
    }

    let response = app
        .oneshot(request("DELETE", "/caches/api/invalidate/user:42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);
}

// == STATS / REPORT ==

#[tokio::test]
async fn test_stats_endpoint_counts() {
    let app = create_test_app();
    app.clone()
        .oneshot(set_request("api", r#"{"key":"k","value":1}"#))
        .await
        .unwrap();
    for uri in [
        "/caches/api/get/k",
        "/caches/api/get/k",
        "/caches/api/get/k",
        "/caches/api/get/missing",
    ] {
        app.clone().oneshot(request("GET", uri)).await.unwrap();
    }

    let response = app.oneshot(request("GET", "/caches/api/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["name"], "api");
    assert_eq!(json["hits"], 3);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hit_rate"], 75.0);
    assert_eq!(json["keys"], 1);
}

#[tokio::test]
async fn test_report_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/caches/api/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "api");
    assert_eq!(json["target_hit_rate"], 85.0);
    assert_eq!(json["config"]["max_keys"], 500);
    assert!(json["top_access_patterns"].is_array());
}

#[tokio::test]
async fn test_list_caches() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/caches")).await.unwrap();
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["caches"], serde_json::json!(["api", "health"]));
}

// == WARMUP / FLUSH ==

#[tokio::test]
async fn test_warmup_endpoint_seeds_critical_keys() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(request("POST", "/caches/health/warmup"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["critical"], 1);

    let response = app
        .oneshot(request("GET", "/caches/health/get/health:db"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flush_and_flush_stats() {
    let app = create_test_app();
    app.clone()
        .oneshot(set_request("api", r#"{"key":"k","value":1}"#))
        .await
        .unwrap();
    app.clone().oneshot(request("GET", "/caches/api/get/k")).await.unwrap();

    let response = app
        .clone()
        .oneshot(request("POST", "/caches/api/flush-stats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = app.clone().oneshot(request("GET", "/caches/api/stats")).await.unwrap();
    let stats = body_to_json(stats.into_body()).await;
    assert_eq!(stats["hits"], 0);
    assert_eq!(stats["keys"], 1);

    app.clone().oneshot(request("POST", "/caches/api/flush")).await.unwrap();
    let stats = app.oneshot(request("GET", "/caches/api/stats")).await.unwrap();
    let stats = body_to_json(stats.into_body()).await;
    assert_eq!(stats["keys"], 0);
}

// == HEALTH ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_cache() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/caches/nope/report")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

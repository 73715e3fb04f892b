//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle of the maintenance API against a
//! cache populated through memoized calls.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crm_cache::cache::{CacheService, CacheStrategy, CallArgs, ManualClock, UserId};
use crm_cache::{api::create_router, AppState, CacheConfig};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, Arc<CacheService>, ManualClock) {
    let clock = ManualClock::new(0);
    let state = AppState::new(CacheService::with_clock(
        CacheConfig::default(),
        Arc::new(clock.clone()),
    ));
    let cache = state.cache.clone();
    (create_router(state), cache, clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

/// Caches one dashboard result per user and one shared client list.
fn populate(cache: &Arc<CacheService>) {
    let dashboard = cache
        .memoize("crm::dashboard::summary", CacheStrategy::Dashboard)
        .user_dependent(true);
    let clients = cache.memoize("crm::clients::list", CacheStrategy::Medium);

    for user in [7i64, 42] {
        let user = UserId::from(user);
        dashboard.call_sync(CallArgs::new().scope(&user), || format!("summary for {user}"));
    }
    clients.call_sync(CallArgs::new().named("page", &1), || vec!["Acme", "Globex"]);
}

// == Health ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _cache, _clock) = create_test_app();

    let (status, json) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Stats ==

#[tokio::test]
async fn test_stats_reflect_memoized_entries() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let (status, json) = send(&app, "GET", "/cache/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_entries"], 3);
    assert_eq!(json["valid_entries"], 3);
    assert_eq!(json["expired_entries"], 0);
    assert_eq!(json["strategy_distribution"]["dashboard"], 2);
    assert_eq!(json["strategy_distribution"]["medium"], 1);
    assert_eq!(json["user_dependencies"]["7"], 1);
    assert_eq!(json["user_dependencies"]["42"], 1);
    assert_eq!(json["ttl_table"]["long"], 3600);
    assert_eq!(json["misses"], 3);
    assert!(json["memory_usage"].as_str().unwrap().ends_with('B'));
}

#[tokio::test]
async fn test_stats_count_expired_entries() {
    let (app, cache, clock) = create_test_app();
    populate(&cache);

    // Dashboard entries (120s) expire, the medium entry (300s) survives
    clock.advance_secs(200);

    let (_, json) = send(&app, "GET", "/cache/stats").await;
    assert_eq!(json["total_entries"], 3);
    assert_eq!(json["valid_entries"], 1);
    assert_eq!(json["expired_entries"], 2);
}

// == Sweep ==

#[tokio::test]
async fn test_sweep_endpoint() {
    let (app, cache, clock) = create_test_app();
    populate(&cache);
    clock.advance_secs(200);

    let (status, json) = send(&app, "POST", "/cache/sweep").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);
    assert_eq!(cache.len(), 1);
    assert!(!cache.is_user_indexed(&UserId::from(7i64)));

    let (_, json) = send(&app, "POST", "/cache/sweep").await;
    assert_eq!(json["removed"], 0);
}

// == User Invalidation ==

#[tokio::test]
async fn test_invalidate_user_endpoint() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let (status, json) = send(&app, "DELETE", "/cache/users/42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);
    assert_eq!(cache.len(), 2);
    assert!(!cache.is_user_indexed(&UserId::from(42i64)));
    assert!(cache.is_user_indexed(&UserId::from(7i64)));
}

#[tokio::test]
async fn test_invalidate_unknown_user_is_noop() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let (status, json) = send(&app, "DELETE", "/cache/users/999").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 0);
    assert_eq!(cache.len(), 3);
}

// == Prefix Invalidation ==

#[tokio::test]
async fn test_invalidate_prefix_removes_user_variants() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let dashboard = cache
        .memoize("crm::dashboard::summary", CacheStrategy::Dashboard)
        .user_dependent(true);
    let base = dashboard.key_for(&CallArgs::new()).unwrap();

    let (status, json) = send(&app, "DELETE", &format!("/cache/prefix/{base}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().user_dependencies.len(), 0);
}

#[tokio::test]
async fn test_invalidate_blank_prefix_rejected() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let (status, json) = send(&app, "DELETE", "/cache/prefix/%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
    assert_eq!(cache.len(), 3);
}

// == Clear ==

#[tokio::test]
async fn test_clear_endpoint() {
    let (app, cache, _clock) = create_test_app();
    populate(&cache);

    let (status, json) = send(&app, "DELETE", "/cache").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("cleared"));
    assert!(cache.is_empty());

    let (_, stats) = send(&app, "GET", "/cache/stats").await;
    assert_eq!(stats["total_entries"], 0);
    assert!(stats["user_dependencies"].as_object().unwrap().is_empty());
}

// == Recompute After Invalidation ==

#[tokio::test]
async fn test_invalidation_forces_recompute() {
    let (app, cache, _clock) = create_test_app();
    let dashboard = cache
        .memoize("crm::dashboard::summary", CacheStrategy::Dashboard)
        .user_dependent(true);
    let user = UserId::from(42i64);
    let mut computed = 0;

    dashboard.call_sync(CallArgs::new().scope(&user), || {
        computed += 1;
        computed
    });
    dashboard.call_sync(CallArgs::new().scope(&user), || {
        computed += 1;
        computed
    });
    assert_eq!(computed, 1);

    send(&app, "DELETE", "/cache/users/42").await;

    let value = dashboard.call_sync(CallArgs::new().scope(&user), || {
        computed += 1;
        computed
    });
    assert_eq!(value, 2);
}

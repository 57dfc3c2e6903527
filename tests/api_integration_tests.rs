//! Integration Tests for the Gateway
//!
//! Runs the router against a local upstream and checks the full
//! request/response cycle, including how many upstream calls were made.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use futures::future::join_all;
use response_cache::{api::create_router, AppState, CacheOptions, CachedClient, ResponseCache};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

/// Starts a fake REST backend and returns its base URL.
async fn spawn_upstream(hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route(
            "/projects/:id/epics",
            get(
                |State(hits): State<Arc<AtomicUsize>>, Path(id): Path<u32>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Json(json!({ "project": id, "epics": ["e1", "e2"] }))
                },
            ),
        )
        .route(
            "/leaves",
            get(
                |State(hits): State<Arc<AtomicUsize>>,
                 Query(query): Query<BTreeMap<String, String>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!(query))
                },
            ),
        )
        .route(
            "/missing",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::NOT_FOUND, "no such resource")
            }),
        )
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn create_gateway(upstream: &str) -> (AppState, Router) {
    let cache = ResponseCache::new(CacheOptions::default());
    let state = AppState::new(CachedClient::new(upstream, cache));
    let router = create_router(state.clone());
    (state, router)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Proxy Endpoint Tests ==

#[tokio::test]
async fn test_repeated_get_hits_upstream_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (state, app) = create_gateway(&upstream);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_request("/api/projects/1/epics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["project"], 1);
        assert_eq!(json["epics"], json!(["e1", "e2"]));
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let stats = state.client.cache().stats();
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.hits, 2);
}

#[tokio::test]
async fn test_concurrent_gets_are_coalesced() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (state, app) = create_gateway(&upstream);

    let requests = (0..10).map(|_| {
        let app = app.clone();
        async move { app.oneshot(get_request("/api/projects/7/epics")).await.unwrap() }
    });
    let responses = join_all(requests).await;

    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["project"], 7);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1, "one upstream call for ten callers");
    assert_eq!(state.client.cache().stats().coalesced, 9);
}

#[tokio::test]
async fn test_query_params_are_part_of_the_key() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (_, app) = create_gateway(&upstream);

    let first = app
        .clone()
        .oneshot(get_request("/api/leaves?status=open&page=1"))
        .await
        .unwrap();
    assert_eq!(
        body_to_json(first.into_body()).await,
        json!({ "page": "1", "status": "open" })
    );

    // Same parameters in another order share the entry.
    app.clone()
        .oneshot(get_request("/api/leaves?page=1&status=open"))
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    app.clone()
        .oneshot(get_request("/api/leaves?page=2&status=open"))
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upstream_error_keeps_status_and_is_not_cached() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (state, app) = create_gateway(&upstream);

    for _ in 0..2 {
        let response = app.clone().oneshot(get_request("/api/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_to_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains("404"));
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2, "failures are retried, not cached");
    let stats = state.client.cache().stats();
    assert_eq!(stats.fetch_failures, 2);
    assert_eq!(stats.pending, 0);
    assert!(state.client.cache().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Grab a free port, then close it again.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_, app) = create_gateway(&format!("http://{addr}"));
    let response = app.oneshot(get_request("/api/users")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// == Cache Management Tests ==

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (_, app) = create_gateway(&upstream);

    app.clone()
        .oneshot(get_request("/api/projects/1/epics"))
        .await
        .unwrap();
    app.clone()
        .oneshot(get_request("/api/projects/2/epics"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache?prefix=GET%20%2Fprojects%2F1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["removed"], 1);

    app.clone()
        .oneshot(get_request("/api/projects/1/epics"))
        .await
        .unwrap();
    app.clone()
        .oneshot(get_request("/api/projects/2/epics"))
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_invalidate_empty_prefix_rejected() {
    let (_, app) = create_gateway("http://127.0.0.1:1");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache?prefix=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_to_json(response.into_body()).await.get("error").is_some());
}

#[tokio::test]
async fn test_stats_endpoint_reports_counters() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(hits.clone()).await;
    let (_, app) = create_gateway(&upstream);

    app.clone()
        .oneshot(get_request("/api/projects/3/epics"))
        .await
        .unwrap();
    app.clone()
        .oneshot(get_request("/api/projects/3/epics"))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/cache/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["fetches"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_, app) = create_gateway("http://127.0.0.1:1");

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

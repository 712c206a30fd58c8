// tests/api_http.rs
//
// HTTP-level tests for the glue Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use beacon_resources::api::{create_router, AppState};
use beacon_resources::geocode::{
    Candidate, Coordinates, GeocodeCache, Geocoder, Geometry, ObjectStore, RegionQualifier,
};
use beacon_resources::pipeline::Pipeline;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

#[derive(Default)]
struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.lock().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no such key: {key}"))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects.lock().insert(key.to_string(), bytes);
        Ok(())
    }
}

struct FixedGeocoder;

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Vec<Candidate>> {
        Ok(vec![Candidate {
            geometry: Geometry {
                location: Coordinates { lat: 41.76, lng: -72.67 },
            },
        }])
    }

    fn name(&self) -> &'static str {
        "Fixed"
    }
}

/// Build the same Router the binary uses, over in-memory fakes.
fn test_router(feed: Json) -> Router {
    let store = Arc::new(MemoryStore::default());
    store
        .objects
        .lock()
        .insert("calendar_events.json".to_string(), feed.to_string().into_bytes());
    router_over(store)
}

fn router_over(store: Arc<MemoryStore>) -> Router {
    let cache = Arc::new(GeocodeCache::new(
        store.clone(),
        Arc::new(FixedGeocoder),
        RegionQualifier {
            name: "Connecticut".into(),
            aliases: vec!["CT".into(), "Connecticut".into()],
        },
        Duration::from_secs(5),
    ));
    let pipeline = Arc::new(Pipeline::new(store, cache, "calendar_events.json".to_string()));
    create_router(AppState { pipeline })
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let app = test_router(serde_json::json!([]));

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8"), "ok");
}

#[tokio::test]
async fn resources_returns_success_envelope() {
    let feed = serde_json::json!([
        {"id": "a", "summary": "Pantry A", "location": "1 First St"},
        {"id": "b", "summary": "No Address"}
    ]);
    let app = test_router(feed);

    let req = Request::builder()
        .method("GET")
        .uri("/resources")
        .body(Body::empty())
        .expect("build GET /resources");

    let resp = app.oneshot(req).await.expect("oneshot /resources");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse resources json");

    assert_eq!(v["status"], "success");
    let data = v["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Pantry A");
    assert_eq!(data[0]["lat"], 41.76);
    assert_eq!(data[0]["lng"], -72.67);
}

#[tokio::test]
async fn missing_feed_returns_500_error_envelope() {
    // No feed object in the store at all.
    let app = router_over(Arc::new(MemoryStore::default()));

    let req = Request::builder()
        .method("GET")
        .uri("/resources")
        .body(Body::empty())
        .expect("build GET /resources");

    let resp = app.oneshot(req).await.expect("oneshot /resources");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse error json");

    assert_eq!(v["status"], "error");
    assert!(v["message"].is_string());
    assert!(v.get("data").is_none());
}

#[tokio::test]
async fn empty_feed_also_reports_error_envelope() {
    // Feed readable but with zero events: indistinguishable from "no data"
    // at the surface, so it gets the same 500 envelope.
    let app = test_router(serde_json::json!([]));

    let req = Request::builder()
        .method("GET")
        .uri("/resources")
        .body(Body::empty())
        .expect("build GET /resources");

    let resp = app.oneshot(req).await.expect("oneshot /resources");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

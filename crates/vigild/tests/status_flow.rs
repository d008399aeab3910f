//! End-to-end flow: probe registry → refresh cycle → HTTP routes.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use vigil_api::ApiState;
use vigil_core::Config;
use vigil_snapshot::{Aggregator, Refresher, SnapshotCache};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn first_refresh_unlocks_the_status_route() {
    let config = Config::default();
    let started_at = Instant::now();
    let probes = vigil_probes::registry(&config, started_at).unwrap();
    let expected: Vec<String> = probes.iter().map(|p| p.name().to_string()).collect();

    let cache = SnapshotCache::new();
    let refresher = Refresher::new(
        Aggregator::new(probes),
        cache.clone(),
        config.refresh_period(),
    );
    let state = ApiState::new(cache, started_at, config.refresh_period());
    let app = vigil_api::build_router(state);

    // Cold start: no snapshot yet, but liveness is already up.
    let response = app.clone().oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(refresher.refresh_once().await);

    let response = app.oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert!(body["timestamp"].is_string());
    // Every registered section is present, no matter which probes
    // degraded on this machine.
    for name in &expected {
        assert!(body.get(name).is_some(), "missing section {name}");
    }
}

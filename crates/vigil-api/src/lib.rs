//! vigil-api — HTTP surface for the Vigil status daemon.
//!
//! Pure read-through to the snapshot cache; no handler ever invokes a
//! probe. That is the design's core latency guarantee: the routing path
//! only touches an in-memory pointer.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` or `/status` | Latest snapshot (503 before first refresh) |
//! | GET | `/health` | Liveness: always 200, independent of the cache |
//! | OPTIONS | any | 204 preflight |
//! | * | other | 404 |
//!
//! Every response carries permissive CORS headers.

pub mod handlers;

use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::get;

use vigil_snapshot::SnapshotCache;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    pub cache: SnapshotCache,
    /// Process start, for the liveness uptime.
    pub started_at: Instant,
    /// Refresh period, echoed as the snapshot's cache-control hint.
    pub refresh_period: Duration,
}

impl ApiState {
    pub fn new(cache: SnapshotCache, started_at: Instant, refresh_period: Duration) -> Self {
        Self {
            cache,
            started_at,
            refresh_period,
        }
    }
}

/// Build the complete router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::status))
        .route("/status", get(handlers::status))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(handlers::cors))
        .with_state(state)
}

//! HTTP handlers and the CORS middleware.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use vigil_core::{Snapshot, format_uptime};

use crate::ApiState;

/// GET `/` and `/status` — the latest snapshot.
///
/// 503 with an error body during cold start, when the first refresh
/// has not completed yet. The cache-control hint matches the refresh
/// period so clients do not poll faster than snapshots change.
pub async fn status(State(state): State<ApiState>) -> Response {
    match state.cache.load() {
        Some(snapshot) => {
            let max_age = state.refresh_period.as_secs_f64().ceil() as u64;
            (
                StatusCode::OK,
                [(
                    header::CACHE_CONTROL,
                    format!("public, max-age={max_age}"),
                )],
                Json(Snapshot::clone(&snapshot)),
            )
                .into_response()
        }
        None => {
            debug!("status requested before the first refresh completed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "starting up, no data yet" })),
            )
                .into_response()
        }
    }
}

/// GET `/health` — liveness, independent of cache state.
pub async fn health(State(state): State<ApiState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "uptime": format_uptime(state.started_at.elapsed()),
    }))
    .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Permissive CORS on every response; `OPTIONS` short-circuits to 204.
pub async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

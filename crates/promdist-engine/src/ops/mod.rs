//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format, rebuilt from the shared store

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::exposition;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    // Store calls block; keep them off the async workers.
    let rendered = tokio::task::spawn_blocking(move || state.registry().render()).await;

    match rendered {
        Ok(Ok(body)) => (StatusCode::OK, [(CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "scrape failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{}: {e}\n", e.code().as_str()),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "scrape task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal\n").into_response()
        }
    }
}

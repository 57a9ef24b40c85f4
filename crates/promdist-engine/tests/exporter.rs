#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::IntoResponse;

use promdist_core::MetricDefinition;
use promdist_engine::app_state::AppState;
use promdist_engine::{config, exposition, ops, Counter, Histogram};

const CFG: &str = r#"
version: 1
prefix: "exp"
metrics:
  - name: "requests_total"
    help: "Requests served"
    type: counter
    labels: ["path"]
  - name: "latency_seconds"
    help: "Request latency"
    type: histogram
    buckets: [0.5, 1.0]
"#;

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn healthz_is_ok() {
    let resp = ops::healthz().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
}

#[tokio::test]
async fn metrics_renders_what_writers_pushed() {
    let state = AppState::new(config::load_from_str(CFG).unwrap()).unwrap();
    assert_eq!(state.registry().len(), 2);

    // A writer with its own family instances on the same store.
    let ctx = state.context().clone();
    let requests = Counter::new(
        &ctx,
        MetricDefinition::counter("requests", "Requests served").labels(["path"]).build().unwrap(),
    )
    .unwrap();
    let latency = Histogram::new(
        &ctx,
        MetricDefinition::histogram("latency_seconds", "Request latency")
            .buckets([0.5, 1.0])
            .build()
            .unwrap(),
    )
    .unwrap();
    requests.labels(&["/"]).unwrap().inc_by(3.0).unwrap();
    latency.observe(0.7).unwrap();

    let resp = ops::metrics(State(state)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
        exposition::CONTENT_TYPE
    );

    let body = body_string(resp).await;
    assert!(body.contains("# HELP requests_total Requests served\n"));
    assert!(body.contains("# TYPE requests_total counter\n"));
    assert!(body.contains("requests_total{path=\"/\"} 3.0\n"));
    assert!(body.contains("latency_seconds_bucket{le=\"0.5\"} 0.0\n"));
    assert!(body.contains("latency_seconds_bucket{le=\"1.0\"} 1.0\n"));
    assert!(body.contains("latency_seconds_bucket{le=\"+Inf\"} 1.0\n"));
    assert!(body.contains("latency_seconds_count 1.0\n"));
    assert!(body.contains("latency_seconds_sum 0.7\n"));
    assert!(body.contains("# TYPE requests_created gauge\n"));
    assert!(body.contains("requests_created{path=\"/\"} "));
}

#[tokio::test]
async fn unreachable_store_is_503() {
    let cfg = config::load_from_str(
        r#"
version: 1
store:
  kind: redis
  url: "redis://127.0.0.1:1/"
  connect_timeout_ms: 200
  response_timeout_ms: 200
metrics:
  - name: "jobs"
    type: counter
"#,
    )
    .unwrap();
    let state = AppState::new(cfg).unwrap();

    let resp = ops::metrics(State(state)).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_string(resp).await.starts_with("STORE_UNAVAILABLE: "));
}

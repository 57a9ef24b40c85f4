//! promdist exporter
//!
//! Serves `/metrics` for the metric families declared in the config file,
//! reading their values back from the shared store.
//! - Config path: `$PROMDIST_CONFIG`, default `promdist.yaml`
//! - Log filter: `$RUST_LOG`

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use promdist_engine::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("PROMDIST_CONFIG").unwrap_or_else(|_| "promdist.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .exporter
        .listen
        .parse()
        .expect("exporter.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("exporter state init failed");
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "promdist-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}

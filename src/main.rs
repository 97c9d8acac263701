//! Relief Tracker — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the fetcher, store, keyword tables and
//! middleware behind the ingest and map-view routes.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relief_tracker::api::{self, AppState};
use relief_tracker::classify::ClassifierTables;
use relief_tracker::config::AppConfig;
use relief_tracker::ingest::fetcher::NewsFeedFetcher;
use relief_tracker::metrics::Metrics;
use relief_tracker::store::MemoryStore;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - INGEST_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("INGEST_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let tables = ClassifierTables::load_default().expect("failed to load keyword tables");

    let metrics = Metrics::init(cfg.cache_ttl_secs);

    let state = AppState {
        fetcher: Arc::new(NewsFeedFetcher::from_url(
            cfg.feed_url.clone(),
            cfg.cache_ttl_secs,
        )),
        store: Arc::new(MemoryStore::new()),
        tables: Arc::new(tables),
        secret: cfg.shared_secret.clone(),
    };

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}

//! Rage2Sage feed service: binary entrypoint.
//! Boots the Axum HTTP server with the feed pipeline, curated store and metrics.

use rage2sage_feed::{api, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `FEED_LOG_FORMAT=json` for structured output.
/// `RUST_LOG` overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rage2sage_feed=info,feed=info,classify=info,warn"));

    let json = std::env::var("FEED_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The runtime may already have installed a subscriber; keep it in that case.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let state = api::AppState::from_env()?;
    let metrics = Metrics::init()?;

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}

//! Live news matcher: binary entrypoint.
//! Boots the Axum server (HTTP page, static assets, WebSocket channel). The
//! generator pair stays idle until a client sends `start_streams`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Local runs get our subscriber; under Shuttle one is already installed
/// and `try_init` leaves it alone. `LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("live_news_matcher=info,warn"));
    let json = std::env::var("LOG_JSON").is_ok_and(|v| v == "1");

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

    let router = live_news_matcher::app().await?;
    Ok(router.into())
}

// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod history;
pub mod matching;
pub mod metrics;
pub mod model;
pub mod service;
pub mod supervisor;
pub mod synth;
pub mod tagging;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::broadcast::{BroadcastHub, Broadcaster, RecordingBroadcaster, ServerEvent};
pub use crate::model::{Article, InitialState, Match, User};
pub use crate::service::LiveFeed;

use axum::Router;
use tracing::info;

use crate::config::{StreamConfig, TaggerConfig};

/// Full in-process app: env config, tag oracle, feed (idle), metrics route.
pub async fn app() -> anyhow::Result<Router> {
    let streams = StreamConfig::load()?;
    let tagger = tagging::build_tag_oracle(&TaggerConfig::from_env());
    let metrics = metrics::Metrics::global(streams.history_capacity)?;

    info!(
        article_tick_ms = streams.article_tick_ms,
        user_tick_ms = streams.user_tick_ms,
        history_capacity = streams.history_capacity,
        tagger = tagger.provider_name(),
        "application started, waiting for a client to start the streams"
    );

    let state = AppState::new(streams, tagger, api::static_dir_from_env());
    Ok(router(state).merge(metrics.router()))
}

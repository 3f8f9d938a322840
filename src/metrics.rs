use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the series.
    pub fn init(history_capacity: usize) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("articles_generated_total", "Articles tagged and broadcast.");
        describe_counter!("users_generated_total", "User profiles broadcast.");
        describe_counter!("matches_emitted_total", "Article/user matches broadcast.");
        describe_counter!(
            "tagger_llm_success_total",
            "Tag sets parsed from the LLM response."
        );
        describe_counter!(
            "tagger_fallback_total",
            "Tag sets produced by the local title heuristic."
        );
        describe_counter!(
            "stream_tick_failures_total",
            "Generator ticks that errored or panicked."
        );
        describe_gauge!(
            "interest_index_users",
            "Distinct user ids in the live interest index (never pruned)."
        );
        describe_gauge!("connected_clients", "Open WebSocket connections.");
        describe_gauge!("streams_running", "1 once the generator pair is started.");
        describe_gauge!("history_capacity", "Per-buffer replay capacity.");

        gauge!("streams_running").set(0.0);
        gauge!("history_capacity").set(history_capacity as f64);

        Ok(Self { handle })
    }

    /// One recorder per process; later calls reuse it.
    pub fn global(history_capacity: usize) -> anyhow::Result<&'static Metrics> {
        GLOBAL.get_or_try_init(|| Self::init(history_capacity))
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

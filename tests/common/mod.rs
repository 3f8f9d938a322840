// tests/common/mod.rs
// Shared stubs: deterministic tag oracles, no network.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use live_news_matcher::config::StreamConfig;
use live_news_matcher::tagging::TagOracle;
use live_news_matcher::{LiveFeed, RecordingBroadcaster};

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Same tags for every article; counts calls (one call == one article tick).
pub struct FixedOracle {
    pub tags: BTreeSet<String>,
    pub calls: AtomicUsize,
}

impl FixedOracle {
    pub fn new(tags: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tags: set(tags),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TagOracle for FixedOracle {
    fn extract_tags<'a>(
        &'a self,
        _title: &'a str,
        _summary: &'a str,
    ) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tags = self.tags.clone();
        Box::pin(async move { tags })
    }
    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

/// Feed wired to a recorder, with the given oracle.
pub fn recorded_feed(
    cfg: StreamConfig,
    oracle: Arc<FixedOracle>,
) -> (Arc<LiveFeed>, Arc<RecordingBroadcaster>) {
    let rec = Arc::new(RecordingBroadcaster::new());
    let feed = Arc::new(LiveFeed::new(cfg, oracle, rec.clone()));
    (feed, rec)
}

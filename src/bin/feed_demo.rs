//! Headless run of the generator pair for a few seconds; matches are printed
//! as JSON lines, everything else is counted.
//!
//! Usage: `cargo run --bin feed_demo -- [seconds]` (default 3).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use live_news_matcher::config::{StreamConfig, TaggerConfig};
use live_news_matcher::tagging::build_tag_oracle;
use live_news_matcher::{Broadcaster, LiveFeed, ServerEvent};

#[derive(Default)]
struct StdoutBroadcaster {
    articles: AtomicUsize,
    users: AtomicUsize,
    matches: AtomicUsize,
}

impl Broadcaster for StdoutBroadcaster {
    fn broadcast_all(&self, event: ServerEvent) {
        match &event {
            ServerEvent::NewArticle(_) => {
                self.articles.fetch_add(1, Ordering::Relaxed);
            }
            ServerEvent::NewUser(_) => {
                self.users.fetch_add(1, Ordering::Relaxed);
            }
            ServerEvent::NewMatch(m) => {
                self.matches.fetch_add(1, Ordering::Relaxed);
                if let Ok(line) = serde_json::to_string(m) {
                    println!("{line}");
                }
            }
            ServerEvent::StreamsStarted | ServerEvent::InitialState(_) => {
                println!("-- {}", event.name());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let secs: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    let out = Arc::new(StdoutBroadcaster::default());
    let tagger = build_tag_oracle(&TaggerConfig::from_env());
    let feed = Arc::new(LiveFeed::new(StreamConfig::load()?, tagger, out.clone()));

    feed.start_streams("feed_demo");
    tokio::time::sleep(Duration::from_secs(secs)).await;

    println!(
        "feed-demo done: {} articles, {} users, {} matches, {} known users",
        out.articles.load(Ordering::Relaxed),
        out.users.load(Ordering::Relaxed),
        out.matches.load(Ordering::Relaxed),
        feed.interests().len()
    );
    Ok(())
}

// tests/live_feed.rs
//
// Pipeline behaviour through the service object with a recording broadcaster:
// - article tick ordering (article before its matches)
// - last-write-wins interest index
// - bounded replay buffers
// - connection greeting before / after start

mod common;

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{recorded_feed, set, FixedOracle};
use live_news_matcher::config::StreamConfig;
use live_news_matcher::tagging::TagOracle;
use live_news_matcher::{LiveFeed, RecordingBroadcaster, ServerEvent, User};

/// Panics on every odd-numbered call, tags `ai` otherwise.
#[derive(Default)]
struct FlakyOracle {
    calls: AtomicUsize,
}

impl TagOracle for FlakyOracle {
    fn extract_tags<'a>(
        &'a self,
        _title: &'a str,
        _summary: &'a str,
    ) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if n % 2 == 1 {
                panic!("tagger blew up on call {n}");
            }
            set(&["ai"])
        })
    }
    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

fn user(id: &str, interests: &[&str]) -> User {
    User::new(id.to_string(), "dynamic_user".to_string(), set(interests))
}

#[tokio::test]
async fn article_tick_records_then_matches_in_order() {
    let oracle = FixedOracle::new(&["ai", "space"]);
    let (feed, rec) = recorded_feed(StreamConfig::default(), oracle.clone());

    feed.publish_user(user("user_1", &["ai", "space", "basketball"]));
    feed.publish_user(user("user_2", &["geopolitics", "mars-rover"]));

    let article = feed.article_tick().await.expect("tick");
    assert_eq!(article.tags, set(&["ai", "space"]));
    assert_eq!(oracle.calls(), 1);

    assert_eq!(rec.names(), vec!["new_user", "new_user", "new_article", "new_match"]);

    let matches = feed.history().matches.snapshot();
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.user_id, "user_1");
    assert_eq!(m.article_id, article.id);
    assert_eq!(m.article_title, article.title);
    assert_eq!(m.score, 0.67);
    assert_eq!(m.matched_tags, set(&["ai", "space"]));
}

#[tokio::test]
async fn untagged_article_is_broadcast_but_never_matched() {
    let (feed, rec) = recorded_feed(StreamConfig::default(), FixedOracle::new(&[]));
    feed.publish_user(user("user_1", &["ai"]));

    let article = feed.article_tick().await.unwrap();
    assert!(article.tags.is_empty());
    assert_eq!(rec.count("new_article"), 1);
    assert_eq!(rec.count("new_match"), 0);
    assert_eq!(feed.history().articles.len(), 1);
}

#[test]
fn later_user_record_replaces_interests() {
    let (feed, _rec) = recorded_feed(StreamConfig::default(), FixedOracle::new(&[]));
    feed.publish_user(user("user_5", &["ai", "space"]));
    feed.publish_user(user("user_5", &["basketball", "nba-playoffs"]));

    assert_eq!(feed.interests().len(), 1);
    assert_eq!(
        feed.interests().get("user_5"),
        Some(set(&["basketball", "nba-playoffs"]))
    );
    // both records stay visible in the display buffer
    assert_eq!(feed.history().users.len(), 2);

    let article = live_news_matcher::Article::new("t".into(), "s".into(), set(&["ai", "space"]));
    assert!(feed.match_article(&article).is_empty());
}

#[test]
fn buffers_cap_at_capacity_but_index_keeps_everyone() {
    let (feed, _rec) = recorded_feed(StreamConfig::default(), FixedOracle::new(&[]));
    for i in 0..35 {
        feed.publish_user(user(&format!("user_{i}"), &["ai", "space"]));
    }
    let users = feed.history().users.snapshot();
    assert_eq!(users.len(), 20);
    assert_eq!(users.first().unwrap().user_id, "user_15");
    assert_eq!(users.last().unwrap().user_id, "user_34");
    assert_eq!(feed.interests().len(), 35);
}

#[test]
fn user_tick_feeds_index_and_buffer() {
    let (feed, rec) = recorded_feed(StreamConfig::default(), FixedOracle::new(&[]));
    let u = feed.user_tick().unwrap();
    assert!((2..=4).contains(&u.interests.len()));
    assert_eq!(feed.interests().get(&u.user_id), Some(u.interests.clone()));
    assert_eq!(rec.names(), vec!["new_user"]);
}

#[test]
fn greeting_before_start_is_empty_initial_state_only() {
    let (feed, _rec) = recorded_feed(StreamConfig::default(), FixedOracle::new(&[]));
    let frames = feed.connect_greeting();
    assert_eq!(frames.len(), 1);
    match &frames[0] {
        ServerEvent::InitialState(s) => {
            assert!(s.articles.is_empty());
            assert!(s.users.is_empty());
            assert!(s.matches.is_empty());
        }
        other => panic!("expected initial_state, got {}", other.name()),
    }
}

#[tokio::test(start_paused = true)]
async fn greeting_after_start_announces_running_then_replays() {
    let cfg = StreamConfig::default();
    let (feed, rec) = recorded_feed(cfg, FixedOracle::new(&["ai"]));

    assert!(feed.start_streams("test"));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let frames = feed.connect_greeting();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], ServerEvent::StreamsStarted);
    match &frames[1] {
        ServerEvent::InitialState(s) => {
            assert!(!s.articles.is_empty());
            assert!(!s.users.is_empty());
            assert!(s.articles.len() <= 20 && s.users.len() <= 20 && s.matches.len() <= 20);
            assert_eq!(s.articles, feed.history().articles.snapshot());
        }
        other => panic!("expected initial_state, got {}", other.name()),
    }
    assert_eq!(rec.count("streams_started"), 1);
    assert_eq!(rec.names().first().copied(), Some("streams_started"));
}

#[tokio::test(start_paused = true)]
async fn panicking_article_ticks_do_not_stop_the_loop() {
    let oracle = Arc::new(FlakyOracle::default());
    let rec = Arc::new(RecordingBroadcaster::new());
    let feed = Arc::new(LiveFeed::new(StreamConfig::default(), oracle.clone(), rec.clone()));

    feed.start_streams("test");
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let calls = oracle.calls.load(Ordering::SeqCst);
    let articles = rec.count("new_article");
    assert!((95..=102).contains(&calls), "article ticks: {calls}");
    // only the even calls get as far as publishing
    assert_eq!(articles, calls.div_ceil(2));
    assert!(articles >= 45, "articles: {articles}");

    // still ticking after the window
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(oracle.calls.load(Ordering::SeqCst) > calls);
    assert!(rec.count("new_user") > 0);
}

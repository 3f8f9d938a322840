//! # Live Feed
//! The process-scoped service: history buffers, live interest index, the
//! start gate and the outbound channel, owned by one object built at startup
//! and shared by `Arc` with handlers and loops.
//!
//! Article tick order is fixed: tag → record + broadcast article → match →
//! record + broadcast each match. The user loop interleaves freely.

use std::sync::Arc;

use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, info};

use crate::broadcast::{DynBroadcaster, ServerEvent};
use crate::config::StreamConfig;
use crate::history::HistoryStore;
use crate::matching::InterestIndex;
use crate::model::{Article, InitialState, Match, User};
use crate::supervisor::{spawn_ticker, StreamSupervisor};
use crate::synth;
use crate::tagging::DynTagOracle;

pub struct LiveFeed {
    cfg: StreamConfig,
    history: HistoryStore,
    interests: InterestIndex,
    supervisor: StreamSupervisor,
    tagger: DynTagOracle,
    out: DynBroadcaster,
}

/// Read-only diagnostic view (`GET /api/state`).
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub running: bool,
    pub known_users: usize,
    #[serde(flatten)]
    pub snapshot: InitialState,
}

impl LiveFeed {
    pub fn new(cfg: StreamConfig, tagger: DynTagOracle, out: DynBroadcaster) -> Self {
        Self {
            history: HistoryStore::with_capacity(cfg.history_capacity),
            interests: InterestIndex::new(),
            supervisor: StreamSupervisor::new(),
            cfg,
            tagger,
            out,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.cfg
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn interests(&self) -> &InterestIndex {
        &self.interests
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Start signal from `origin`. Launches the loop pair on the first call
    /// only; later calls are logged no-ops. Returns whether this call started them.
    pub fn start_streams(self: &Arc<Self>, origin: &str) -> bool {
        if !self.supervisor.try_start() {
            info!(target: "streams", %origin, "start signal received, streams already running");
            return false;
        }
        info!(target: "streams", %origin, "start signal received, starting data streams");
        gauge!("streams_running").set(1.0);
        self.out.broadcast_all(ServerEvent::StreamsStarted);

        let feed = Arc::clone(self);
        spawn_ticker("articles", self.cfg.article_interval(), move || {
            let feed = Arc::clone(&feed);
            async move { feed.article_tick().await.map(drop) }
        });

        let feed = Arc::clone(self);
        spawn_ticker("users", self.cfg.user_interval(), move || {
            let feed = Arc::clone(&feed);
            async move { feed.user_tick().map(drop) }
        });
        true
    }

    /// One article loop iteration.
    pub async fn article_tick(&self) -> anyhow::Result<Article> {
        let (title, summary) = synth::next_article_content(&mut rand::rng());
        let tags = self.tagger.extract_tags(&title, &summary).await;
        let article = Article::new(title, summary, tags);
        self.publish_article(article.clone());
        Ok(article)
    }

    /// One user loop iteration.
    pub fn user_tick(&self) -> anyhow::Result<User> {
        let (user_id, persona, interests) = synth::next_user_content(&mut rand::rng());
        let user = User::new(user_id, persona, interests);
        self.publish_user(user.clone());
        Ok(user)
    }

    /// Record + broadcast a tagged article, then run matching on it.
    pub fn publish_article(&self, article: Article) -> Vec<Match> {
        self.history.articles.push(article.clone());
        counter!("articles_generated_total").increment(1);
        self.out.broadcast_all(ServerEvent::NewArticle(article.clone()));
        self.match_article(&article)
    }

    /// Replace the user's interests in the live index, then record + broadcast.
    pub fn publish_user(&self, user: User) {
        let known = self.interests.upsert(&user.user_id, user.interests.clone());
        gauge!("interest_index_users").set(known as f64);
        self.history.users.push(user.clone());
        counter!("users_generated_total").increment(1);
        self.out.broadcast_all(ServerEvent::NewUser(user));
    }

    /// Score against every known user; each qualifying match is recorded and broadcast.
    pub fn match_article(&self, article: &Article) -> Vec<Match> {
        let matches = self
            .interests
            .match_article(article, self.cfg.match_threshold);
        for m in &matches {
            self.history.matches.push(m.clone());
            self.out.broadcast_all(ServerEvent::NewMatch(m.clone()));
        }
        if !matches.is_empty() {
            counter!("matches_emitted_total").increment(matches.len() as u64);
            debug!(target: "matching", article_id = %article.id, matches = matches.len(), "article matched");
        }
        matches
    }

    /// Frames for a fresh connection: `streams_started` iff running, then `initial_state`.
    pub fn connect_greeting(&self) -> Vec<ServerEvent> {
        let mut frames = Vec::with_capacity(2);
        if self.is_running() {
            frames.push(ServerEvent::StreamsStarted);
        }
        frames.push(ServerEvent::InitialState(self.history.snapshot()));
        frames
    }

    pub fn state_view(&self) -> StateView {
        StateView {
            running: self.is_running(),
            known_users: self.interests.len(),
            snapshot: self.history.snapshot(),
        }
    }
}

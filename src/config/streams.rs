// src/config/streams.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use std::{env, fs};
use tracing::warn;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::matching::DEFAULT_MATCH_THRESHOLD;

pub const DEFAULT_STREAMS_CONFIG_PATH: &str = "config/streams.toml";
pub const ENV_STREAMS_CONFIG_PATH: &str = "STREAMS_CONFIG_PATH";

pub const ENV_ARTICLE_TICK_MS: &str = "ARTICLE_TICK_MS";
pub const ENV_USER_TICK_MS: &str = "USER_TICK_MS";
pub const ENV_HISTORY_CAPACITY: &str = "HISTORY_CAPACITY";
pub const ENV_MATCH_THRESHOLD: &str = "MATCH_THRESHOLD";

const MAX_HISTORY_CAPACITY: usize = 1000;

fn default_article_tick_ms() -> u64 {
    10 // ~100 Hz
}
fn default_user_tick_ms() -> u64 {
    67 // ~15 Hz
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_match_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

/// Cadences and limits for the generator pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_article_tick_ms")]
    pub article_tick_ms: u64,
    #[serde(default = "default_user_tick_ms")]
    pub user_tick_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            article_tick_ms: default_article_tick_ms(),
            user_tick_ms: default_user_tick_ms(),
            history_capacity: default_history_capacity(),
            match_threshold: default_match_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamsRoot {
    #[serde(default)]
    streams: Option<StreamConfig>,
}

impl StreamConfig {
    /// File (if present) → env overrides → sanitized.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_STREAMS_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_STREAMS_CONFIG_PATH.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_str(&fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        let cfg = base.with_env_overrides().sanitized();
        for key in cfg.deviations() {
            warn!(
                target: "streams",
                key,
                history_capacity = cfg.history_capacity,
                match_threshold = cfg.match_threshold,
                "running with a non-default replay/matching limit"
            );
        }
        Ok(cfg)
    }

    /// Limits that differ from the built-in replay capacity / match threshold.
    pub fn deviations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.history_capacity != DEFAULT_HISTORY_CAPACITY {
            out.push(ENV_HISTORY_CAPACITY);
        }
        if (self.match_threshold - DEFAULT_MATCH_THRESHOLD).abs() > f64::EPSILON {
            out.push(ENV_MATCH_THRESHOLD);
        }
        out
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let root: StreamsRoot = toml::from_str(s)?;
        Ok(root.streams.unwrap_or_default())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = parse_env::<u64>(ENV_ARTICLE_TICK_MS) {
            self.article_tick_ms = v;
        }
        if let Some(v) = parse_env::<u64>(ENV_USER_TICK_MS) {
            self.user_tick_ms = v;
        }
        if let Some(v) = parse_env::<usize>(ENV_HISTORY_CAPACITY) {
            self.history_capacity = v;
        }
        if let Some(v) = parse_env::<f64>(ENV_MATCH_THRESHOLD) {
            self.match_threshold = v;
        }
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.history_capacity = self.history_capacity.clamp(1, MAX_HISTORY_CAPACITY);
        if !self.match_threshold.is_finite() {
            self.match_threshold = default_match_threshold();
        }
        self.match_threshold = self.match_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn article_interval(&self) -> Duration {
        Duration::from_millis(self.article_tick_ms)
    }

    pub fn user_interval(&self) -> Duration {
        Duration::from_millis(self.user_tick_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(target: "streams", key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

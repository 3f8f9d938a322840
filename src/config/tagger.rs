// src/config/tagger.rs
use std::env;

pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_MODEL: &str = "TAGGER_MODEL";
pub const ENV_ENDPOINT: &str = "TAGGER_ENDPOINT";
pub const ENV_TEST_MODE: &str = "AI_TEST_MODE";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Tag oracle settings. A missing key is a supported setup: tagging then
/// runs on the local title heuristic only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// `AI_TEST_MODE=mock` → deterministic provider, no network.
    pub mock: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            mock: false,
        }
    }
}

impl TaggerConfig {
    pub fn from_env() -> Self {
        let non_blank = |k: &str| {
            env::var(k)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            api_key: non_blank(ENV_API_KEY),
            model: non_blank(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: non_blank(ENV_ENDPOINT)
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            mock: non_blank(ENV_TEST_MODE).is_some_and(|v| v.eq_ignore_ascii_case("mock")),
        }
    }

    /// Safe for logs: never the key itself.
    pub fn key_len(&self) -> usize {
        self.api_key.as_deref().map_or(0, str::len)
    }
}

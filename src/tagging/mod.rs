//! Tag oracle: provider abstraction + never-failing fallback.
//!
//! `TagOracle::extract_tags` always yields a tag set. Provider errors of any
//! kind (no key, network, non-JSON, wrong shape) are logged and replaced by
//! the local title heuristic.

pub mod gemini;
pub mod parse;

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::config::TaggerConfig;
use crate::error::TagError;
pub use gemini::GeminiProvider;
pub use parse::{build_prompt, fallback_tags, parse_tag_response};

/// What callers (the article loop, tests) depend on.
pub trait TagOracle: Send + Sync {
    fn extract_tags<'a>(
        &'a self,
        title: &'a str,
        summary: &'a str,
    ) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynTagOracle = Arc<dyn TagOracle>;

/// One tagging call as seen by a provider.
#[derive(Debug, Clone)]
pub struct TagRequest<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub prompt: String,
}

/// Low-level remote call returning the model's raw text.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    async fn fetch(&self, req: &TagRequest<'_>) -> Result<String, TagError>;
    fn name(&self) -> &'static str;
}

/// Provider-backed oracle; degrades to `fallback_tags` on any error.
pub struct OracleTagger<P: Provider> {
    inner: P,
}

impl<P: Provider> OracleTagger<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    async fn extract_impl(&self, title: &str, summary: &str) -> BTreeSet<String> {
        let req = TagRequest {
            title,
            summary,
            prompt: build_prompt(title, summary),
        };
        debug!(target: "tagger", provider = self.inner.name(), %title, prompt = %req.prompt, "sending tag request");

        let outcome = match self.inner.fetch(&req).await {
            Ok(raw) => {
                debug!(target: "tagger", raw = %raw, "raw tag response");
                parse_tag_response(&raw)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(tags) => {
                counter!("tagger_llm_success_total").increment(1);
                info!(target: "tagger", ?tags, "parsed tags");
                tags
            }
            Err(e) => {
                counter!("tagger_fallback_total", "reason" => e.kind()).increment(1);
                warn!(target: "tagger", error = %e, %title, "tagging failed, using fallback");
                fallback_tags(title)
            }
        }
    }
}

impl<P: Provider> TagOracle for OracleTagger<P> {
    fn extract_tags<'a>(
        &'a self,
        title: &'a str,
        summary: &'a str,
    ) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>> {
        Box::pin(self.extract_impl(title, summary))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

/// No credentials: title heuristic only, no network.
pub struct LocalTagger;

impl TagOracle for LocalTagger {
    fn extract_tags<'a>(
        &'a self,
        title: &'a str,
        _summary: &'a str,
    ) -> Pin<Box<dyn Future<Output = BTreeSet<String>> + Send + 'a>> {
        counter!("tagger_fallback_total", "reason" => "missing_key").increment(1);
        let tags = fallback_tags(title);
        Box::pin(async move { tags })
    }
    fn provider_name(&self) -> &'static str {
        "local"
    }
}

/// Deterministic provider for local runs/tests. With `fixed` unset it
/// answers with the vocabulary topic named in the title, fenced like a
/// chatty model would.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub fixed: Option<String>,
}

#[async_trait]
impl Provider for MockProvider {
    async fn fetch(&self, req: &TagRequest<'_>) -> Result<String, TagError> {
        if let Some(s) = &self.fixed {
            return Ok(s.clone());
        }
        let lowered = req.title.to_lowercase();
        let topics: Vec<&str> = crate::synth::TOPICS
            .iter()
            .copied()
            .filter(|t| lowered.contains(&t.replace('-', " ")))
            .collect();
        Ok(format!("```json\n{}\n```", serde_json::json!(topics)))
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Factory: mock (AI_TEST_MODE=mock) → Gemini (key present) → local heuristic.
pub fn build_tag_oracle(cfg: &TaggerConfig) -> DynTagOracle {
    if cfg.mock {
        info!(target: "tagger", "AI_TEST_MODE=mock, using mock tag provider");
        return Arc::new(OracleTagger::new(MockProvider::default()));
    }
    if cfg.api_key.is_none() {
        warn!(target: "tagger", "GOOGLE_API_KEY not set, tags come from the local title heuristic");
        return Arc::new(LocalTagger);
    }
    match GeminiProvider::new(cfg) {
        Ok(p) => {
            info!(target: "tagger", model = %cfg.model, key_len = cfg.key_len(), "Gemini tagging enabled");
            Arc::new(OracleTagger::new(p))
        }
        Err(e) => {
            warn!(target: "tagger", error = %e, "could not build Gemini client, using local heuristic");
            Arc::new(LocalTagger)
        }
    }
}

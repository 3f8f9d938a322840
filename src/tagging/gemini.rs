// src/tagging/gemini.rs
//! Gemini `generateContent` provider. Returns the model's raw text; parsing
//! and fallback live in the oracle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Provider, TagRequest};
use crate::config::TaggerConfig;
use crate::error::TagError;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GeminiProvider {
    /// No request timeout: a stalled call holds up only the article loop.
    pub fn new(cfg: &TaggerConfig) -> Result<Self, TagError> {
        let api_key = cfg.api_key.clone().ok_or(TagError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("live-news-matcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key,
            url: format!("{}/models/{}:generateContent", cfg.endpoint, cfg.model),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReq<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentIn>,
}

#[derive(Deserialize)]
struct ContentIn {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

fn request_body(prompt: &str) -> GenerateReq<'_> {
    GenerateReq {
        contents: vec![Content {
            parts: vec![PartOut { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.2,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 2048,
        },
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|c| SafetySetting {
                category: c,
                threshold: "BLOCK_NONE",
            })
            .collect(),
    }
}

/// Concatenated text of the first candidate's parts.
fn response_text(resp: GenerateResp) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn fetch(&self, req: &TagRequest<'_>) -> Result<String, TagError> {
        let resp = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(&req.prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TagError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        let body: GenerateResp = resp.json().await?;
        response_text(body).ok_or(TagError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

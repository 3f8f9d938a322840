//! Error types for the tagging path. None of these reach a client or a
//! stream loop: the oracle logs them and falls back.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tagging service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty response from tagging service")]
    EmptyResponse,

    #[error("response is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a list of strings")]
    NotStringList,
}

impl TagError {
    /// Short label for metrics/log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TagError::MissingApiKey => "missing_key",
            TagError::Http(_) => "http",
            TagError::Status { .. } => "status",
            TagError::EmptyResponse => "empty",
            TagError::Json(_) => "json",
            TagError::NotStringList => "not_string_list",
        }
    }
}

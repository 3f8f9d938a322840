// src/tagging/parse.rs
//! Prompt construction, response parsing and the local title heuristic.

use std::collections::BTreeSet;

use crate::error::TagError;

const PROMPT_TEMPLATE: &str = r#"
Your task is to act as an expert tag extractor.
From the following news article title and summary, extract 5-7 relevant, concise, lowercase, single-word or hyphenated semantic tags.
Your response MUST be a valid JSON list of strings and nothing else. Do not add any explanatory text, markdown, or apologies.

Example Input:
Title: QuantumCorp unveils new 512-qubit processor
Summary: The tech giant QuantumCorp has announced a breakthrough in quantum computing.

Example Output:
["quantum-computing", "processors", "tech", "hardware", "innovation"]

Now, process the following article:
Title: {title}
Summary: {summary}
"#;

pub fn build_prompt(title: &str, summary: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{summary}", summary)
}

/// Drop surrounding whitespace and any ``` / ```json fences.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Lowercase, spaces → hyphens.
pub fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase().replace(' ', "-")
}

/// Model output → tag set. Anything other than a JSON array of strings is an error.
pub fn parse_tag_response(raw: &str) -> Result<BTreeSet<String>, TagError> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned)?;
    let items = value.as_array().ok_or(TagError::NotStringList)?;
    items
        .iter()
        .map(|t| t.as_str().map(normalize_tag).ok_or(TagError::NotStringList))
        .collect()
}

/// Deterministic, offline: lowercased whitespace-separated title words longer than 4 chars.
pub fn fallback_tags(title: &str) -> BTreeSet<String> {
    title
        .split_whitespace()
        .filter(|w| w.chars().count() > 4)
        .map(str::to_lowercase)
        .collect()
}

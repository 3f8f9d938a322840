//! Synthetic article and user content sampled from a fixed topic vocabulary.
//!
//! Callers pass the RNG so tests can seed it; the stream loops use a fresh
//! `rand::rng()` per tick.

use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;

/// Shared read-only vocabulary for titles and interests.
pub const TOPICS: [&str; 15] = [
    "artificial-intelligence",
    "quantum-computing",
    "basketball",
    "nba-playoffs",
    "stock-market",
    "investment-strategies",
    "geopolitics",
    "election-results",
    "mental-health",
    "nutrition-science",
    "space-exploration",
    "mars-rover",
    "cryptocurrency-trends",
    "electric-vehicles",
    "battery-technology",
];

pub const PERSONA: &str = "dynamic_user";
pub const MAX_USER_ID: u32 = 1000;

const FILLER: &[&str] = &[
    "analysts", "report", "market", "global", "leaders", "discuss", "future", "growth", "policy",
    "sources", "confirm", "major", "change", "experts", "warn", "record", "results", "early",
    "signals", "strong", "recovery", "shift", "public", "debate", "rising", "demand", "latest",
    "survey", "shows", "surprising", "trend", "officials", "announce", "plans", "community",
    "reacts", "quickly", "new", "study", "finds", "impact", "across", "sector", "investors",
    "watch", "closely", "team", "unveils", "bold", "strategy",
];

fn sentence<R: Rng + ?Sized>(rng: &mut R, words: usize) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(words);
    for _ in 0..words {
        if let Some(w) = FILLER.choose(rng) {
            out.push(*w);
        }
    }
    let mut s = out.join(" ");
    if let Some(first) = s.get(0..1).map(str::to_ascii_uppercase) {
        s.replace_range(0..1, &first);
    }
    s.push('.');
    s
}

/// `(title, summary)` for one article. The title names one topic.
pub fn next_article_content<R: Rng + ?Sized>(rng: &mut R) -> (String, String) {
    let topic = TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]);
    let title = format!(
        "Breaking News on {}: {}",
        topic.replace('-', " "),
        sentence(rng, 5)
    );
    let n1 = rng.random_range(6..=12);
    let n2 = rng.random_range(6..=12);
    let summary = format!("{} {}", sentence(rng, n1), sentence(rng, n2));
    (title, summary)
}

/// `(user_id, persona, interests)`. Ids collide across ticks on purpose;
/// interests are 2–4 distinct topics.
pub fn next_user_content<R: Rng + ?Sized>(rng: &mut R) -> (String, String, BTreeSet<String>) {
    let user_id = format!("user_{}", rng.random_range(1..=MAX_USER_ID));
    let k = rng.random_range(2..=4);
    let interests = TOPICS
        .choose_multiple(rng, k)
        .map(|t| t.to_string())
        .collect();
    (user_id, PERSONA.to_string(), interests)
}

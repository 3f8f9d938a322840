//! # Matching Engine
//! Pure tag-overlap scoring plus the live interest index it runs against.
//!
//! Score is Jaccard similarity `|A ∩ I| / |A ∪ I|` between the article's tags
//! and a user's interests. A match needs a non-empty overlap and a score
//! strictly above the threshold; the emitted score is rounded to 2 decimals.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::model::{Article, Match};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.2;

/// Unrounded Jaccard score and the overlap, or `None` when nothing overlaps.
pub fn overlap_score(
    tags: &BTreeSet<String>,
    interests: &BTreeSet<String>,
) -> Option<(f64, BTreeSet<String>)> {
    if tags.is_empty() || interests.is_empty() {
        return None;
    }
    let overlap: BTreeSet<String> = tags.intersection(interests).cloned().collect();
    if overlap.is_empty() {
        return None;
    }
    let union = tags.union(interests).count();
    Some((overlap.len() as f64 / union as f64, overlap))
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Score `article` against every `(user_id, interests)` pair. No ordering
/// guarantee across users; each user is scored once.
pub fn find_matches<'a, I>(article: &Article, users: I, threshold: f64) -> Vec<Match>
where
    I: IntoIterator<Item = (&'a String, &'a BTreeSet<String>)>,
{
    if article.tags.is_empty() {
        return Vec::new();
    }
    let now = Utc::now();
    users
        .into_iter()
        .filter_map(|(user_id, interests)| {
            let (score, overlap) = overlap_score(&article.tags, interests)?;
            (score > threshold).then(|| Match {
                user_id: user_id.clone(),
                article_id: article.id,
                article_title: article.title.clone(),
                score: round2(score),
                matched_tags: overlap,
                matched_at: now,
            })
        })
        .collect()
}

/// user_id → interests, last write wins. Never pruned: grows with every
/// distinct id ever generated.
#[derive(Debug, Default)]
pub struct InterestIndex {
    inner: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl InterestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (never merge) the interest set for `user_id`. Returns the index size.
    pub fn upsert(&self, user_id: &str, interests: BTreeSet<String>) -> usize {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.insert(user_id.to_string(), interests);
        g.len()
    }

    pub fn get(&self, user_id: &str) -> Option<BTreeSet<String>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Score against a consistent view of the index; the lock is held only for the scan.
    pub fn match_article(&self, article: &Article, threshold: f64) -> Vec<Match> {
        let g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        find_matches(article, g.iter(), threshold)
    }
}

//! # Data model
//! Articles, users and matches as they travel over the wire.
//!
//! Field names follow the dashboard's JSON contract (`llm_tags`, `user_id`,
//! `timestamp`, ...). Sets are `BTreeSet` so they serialise as sorted arrays.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated news item. Immutable once tagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    #[serde(rename = "llm_tags")]
    pub tags: BTreeSet<String>,
    #[serde(rename = "timestamp", with = "unix_secs")]
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(title: String, summary: String, tags: BTreeSet<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            summary,
            tags,
            created_at: Utc::now(),
        }
    }
}

/// Synthetic user profile. A later user with the same id replaces the
/// earlier interest set in the live index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: String,
    pub persona: String,
    pub interests: BTreeSet<String>,
    #[serde(rename = "timestamp", with = "unix_secs")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: String, persona: String, interests: BTreeSet<String>) -> Self {
        Self {
            user_id,
            persona,
            interests,
            created_at: Utc::now(),
        }
    }
}

/// Article-to-user match. `score` is in (threshold, 1.0], rounded to 2 decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub user_id: String,
    pub article_id: Uuid,
    pub article_title: String,
    pub score: f64,
    pub matched_tags: BTreeSet<String>,
    #[serde(with = "unix_secs")]
    pub matched_at: DateTime<Utc>,
}

/// Replay payload sent once per connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InitialState {
    pub articles: Vec<Article>,
    pub users: Vec<User>,
    pub matches: Vec<Match>,
}

/// Timestamps as fractional UNIX seconds (what the dashboard feeds to `new Date(ts * 1000)`).
mod unix_secs {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        let secs = ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1e6;
        s.serialize_f64(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(d)?;
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round() as u32;
        Utc.timestamp_opt(whole as i64, nanos.min(999_999_999))
            .single()
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {secs}")))
    }
}

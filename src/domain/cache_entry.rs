use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::NewsItem;

/// Snapshot of the last successful aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub items: Vec<NewsItem>,
    pub captured_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(items: Vec<NewsItem>, captured_at: DateTime<Utc>) -> Self {
        Self { items, captured_at }
    }

    /// An entry is expired once strictly more than `ttl` has passed.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.captured_at > ttl
    }
}

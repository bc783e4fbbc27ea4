use chrono::{DateTime, Utc};

use crate::domain::NewsItem;
use crate::services::aggregate_service::{fallback_items, Aggregator, SourceFailure};
use crate::services::cache_service::OfflineCache;
use crate::sources::{FeedRegistry, Transport};
use crate::storage::traits::KeyValueStore;

/// Where a set of headlines came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Live,
    Cached,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Headlines {
    pub items: Vec<NewsItem>,
    pub origin: Origin,
    /// Snapshot time for cached headlines.
    pub captured_at: Option<DateTime<Utc>>,
    pub failures: Vec<SourceFailure>,
}

/// Live aggregation backed by the offline cache.
pub struct NewsService<T: Transport, S: KeyValueStore> {
    aggregator: Aggregator<T>,
    cache: OfflineCache<S>,
    registry: FeedRegistry,
}

impl<T: Transport + 'static, S: KeyValueStore> NewsService<T, S> {
    pub fn new(aggregator: Aggregator<T>, cache: OfflineCache<S>, registry: FeedRegistry) -> Self {
        Self {
            aggregator,
            cache,
            registry,
        }
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &OfflineCache<S> {
        &self.cache
    }

    /// Aggregates all feeds. A real result refreshes the cache; if every feed
    /// came back empty or failed, a fresh cached snapshot is served instead.
    pub async fn headlines(&self) -> Headlines {
        let report = self.aggregator.aggregate(self.registry.feeds()).await;

        if report.is_fallback {
            let mut headlines = self.offline();
            headlines.failures = report.failures;
            return headlines;
        }

        if let Err(e) = self.cache.save(&report.items) {
            tracing::warn!(error = %e, "Failed to cache headlines");
        }

        Headlines {
            items: report.items,
            origin: Origin::Live,
            captured_at: None,
            failures: report.failures,
        }
    }

    /// Serves the cached snapshot without touching the network.
    pub fn offline(&self) -> Headlines {
        match self.cache.load_entry() {
            Ok(Some(entry)) => Headlines {
                items: entry.items,
                origin: Origin::Cached,
                captured_at: Some(entry.captured_at),
                failures: Vec::new(),
            },
            Ok(None) => Self::placeholder(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached headlines");
                Self::placeholder()
            }
        }
    }

    fn placeholder() -> Headlines {
        Headlines {
            items: fallback_items(Utc::now()),
            origin: Origin::Fallback,
            captured_at: None,
            failures: Vec::new(),
        }
    }
}

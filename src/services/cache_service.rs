use chrono::{DateTime, Duration, Utc};

use crate::domain::{CacheEntry, NewsItem};
use crate::errors::NewsResult;
use crate::storage::traits::KeyValueStore;

pub const CACHE_KEY: &str = "news-cache";
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Single-slot, time-bounded snapshot of the last good aggregation.
pub struct OfflineCache<S: KeyValueStore> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> OfflineCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces any previous snapshot with a copy of `items`.
    pub fn save(&self, items: &[NewsItem]) -> NewsResult<()> {
        self.save_at(items, Utc::now())
    }

    pub fn save_at(&self, items: &[NewsItem], now: DateTime<Utc>) -> NewsResult<()> {
        let entry = CacheEntry::new(items.to_vec(), now);
        let json = serde_json::to_string(&entry)?;
        self.store.put(CACHE_KEY, &json)?;
        tracing::debug!(items = items.len(), "Cached aggregation snapshot");
        Ok(())
    }

    /// The cached items if the snapshot is still within its TTL.
    pub fn load(&self) -> NewsResult<Option<Vec<NewsItem>>> {
        Ok(self.load_entry_at(Utc::now())?.map(|entry| entry.items))
    }

    pub fn load_entry(&self) -> NewsResult<Option<CacheEntry>> {
        self.load_entry_at(Utc::now())
    }

    /// Expired or unreadable snapshots are evicted and reported as absent.
    pub fn load_entry_at(&self, now: DateTime<Utc>) -> NewsResult<Option<CacheEntry>> {
        let Some(raw) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.is_expired(now, self.ttl) => {
                tracing::info!(captured_at = %entry.captured_at, "Cached news expired, evicting");
                self.store.remove(CACHE_KEY)?;
                Ok(None)
            }
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(error = %e, "Cached news unreadable, evicting");
                self.store.remove(CACHE_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> NewsResult<()> {
        self.store.remove(CACHE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::errors::NewsError;
    use crate::storage::traits::MockKeyValueStore;
    use crate::storage::{MemoryKeyValueStore, SqliteKeyValueStore, SqliteStorage};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn captured() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn sample_items() -> Vec<NewsItem> {
        vec![
            NewsItem::new("Second", "http://b", captured(), "Feed")
                .unwrap()
                .with_category(Category::Sports)
                .with_image_url(Some("http://img/b.jpg".to_string())),
            NewsItem::new("First", "http://a", captured() - Duration::hours(1), "Feed")
                .unwrap()
                .with_description("Body"),
        ]
    }

    #[test]
    fn test_round_trip_within_ttl() {
        let cache = OfflineCache::new(MemoryKeyValueStore::new());
        cache.save_at(&sample_items(), captured()).unwrap();

        let entry = cache
            .load_entry_at(captured() + Duration::minutes(29))
            .unwrap()
            .unwrap();
        assert_eq!(entry.items, sample_items());
        assert_eq!(entry.captured_at, captured());
    }

    #[test]
    fn test_exactly_ttl_is_still_fresh() {
        let cache = OfflineCache::new(MemoryKeyValueStore::new());
        cache.save_at(&sample_items(), captured()).unwrap();

        assert!(cache
            .load_entry_at(captured() + Duration::minutes(30))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let store = MemoryKeyValueStore::new();
        let cache = OfflineCache::new(store.clone());
        cache.save_at(&sample_items(), captured()).unwrap();

        let later = captured() + Duration::minutes(31);
        assert!(cache.load_entry_at(later).unwrap().is_none());
        assert!(store.get(CACHE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let cache = OfflineCache::new(MemoryKeyValueStore::new()).with_ttl(Duration::minutes(5));
        cache.save_at(&sample_items(), captured()).unwrap();

        assert!(cache
            .load_entry_at(captured() + Duration::minutes(6))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let cache = OfflineCache::new(MemoryKeyValueStore::new());
        cache.save_at(&sample_items(), captured()).unwrap();

        let newer = vec![NewsItem::new("Only", "http://c", captured(), "Feed").unwrap()];
        let later = captured() + Duration::minutes(10);
        cache.save_at(&newer, later).unwrap();

        let entry = cache.load_entry_at(later).unwrap().unwrap();
        assert_eq!(entry.items, newer);
        assert_eq!(entry.captured_at, later);
    }

    #[test]
    fn test_load_uses_current_time() {
        let cache = OfflineCache::new(MemoryKeyValueStore::new());
        cache.save(&sample_items()).unwrap();
        assert_eq!(cache.load().unwrap(), Some(sample_items()));
    }

    #[test]
    fn test_corrupt_entry_is_evicted() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .withf(|key| key == CACHE_KEY)
            .returning(|_| Ok(Some("{not json".to_string())));
        store
            .expect_remove()
            .withf(|key| key == CACHE_KEY)
            .times(1)
            .returning(|_| Ok(()));

        let cache = OfflineCache::new(store);
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_store_errors_propagate() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_put()
            .returning(|_, _| Err(NewsError::Database(rusqlite::Error::InvalidQuery)));

        let cache = OfflineCache::new(store);
        assert!(matches!(
            cache.save(&sample_items()),
            Err(NewsError::Database(_))
        ));
    }

    #[test]
    fn test_snapshot_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("news.db");

        {
            let store = SqliteKeyValueStore::new(SqliteStorage::new(&db_path).unwrap());
            OfflineCache::new(store).save(&sample_items()).unwrap();
        }

        let store = SqliteKeyValueStore::new(SqliteStorage::new(&db_path).unwrap());
        assert_eq!(
            OfflineCache::new(store).load().unwrap(),
            Some(sample_items())
        );
    }
}

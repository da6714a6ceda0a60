use std::sync::Arc;
use std::time::Instant;

use pitchline_core::config::CacheConfig;
use pitchline_store::KvStore;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::classify::{classify, Category};
use crate::types::{CacheRecord, CacheStatistics, CacheStatsSnapshot};
use crate::Result;

const SCAN_BATCH: u64 = 200;

/// Semantic-ish response cache (C4): a content-addressed key over
/// `message|context|category`, namespaced per classified category so a
/// blanket clear can target one category at a time.
pub struct ResponseCache {
    store: Arc<dyn KvStore>,
    config: CacheConfig,
    stats: CacheStatistics,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            stats: CacheStatistics::default(),
        }
    }

    /// Looks up a cached response for `message` given the formatted recent
    /// conversation `context`. Personalised messages never hit the cache.
    #[instrument(skip(self, context))]
    pub fn get(&self, message: &str, context: &str) -> Result<Option<String>> {
        let started = Instant::now();
        let category = classify(message);
        if category == Category::NoCache {
            self.stats.record_no_cache();
            return Ok(None);
        }

        let key = cache_key(message, context, category);
        let result = (|| -> Result<Option<String>> {
            match self.store.get(&key)? {
                Some(raw) => {
                    let record: CacheRecord = serde_json::from_str(&raw)?;
                    Ok(Some(record.response))
                }
                None => Ok(None),
            }
        })();

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(Some(_)) => self.stats.record_hit(category, elapsed_ms),
            Ok(None) => self.stats.record_miss(category, elapsed_ms),
            Err(_) => self.stats.record_error(),
        }
        result
    }

    /// Stores `response` for `message`/`context`, keyed and TTL'd by the
    /// message's classified category. No-op for personalised messages.
    #[instrument(skip(self, context, response))]
    pub fn set(&self, message: &str, context: &str, response: &str) -> Result<()> {
        let category = classify(message);
        if category == Category::NoCache {
            self.stats.record_no_cache();
            return Ok(());
        }

        let key = cache_key(message, context, category);
        let ttl_secs = self.ttl_for(category);
        let record = CacheRecord {
            response: response.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            message: message.to_string(),
            context: context.to_string(),
            category: category.as_str().to_string(),
            ttl_hours: ttl_secs as f64 / 3600.0,
        };

        match self
            .store
            .set_ex(&key, &serde_json::to_string(&record)?, ttl_secs)
        {
            Ok(()) => {
                self.stats.record_save();
                Ok(())
            }
            Err(e) => {
                self.stats.record_error();
                Err(e.into())
            }
        }
    }

    /// Deletes every cached entry, or only those under one classified
    /// category when `category` is `Some`. Returns the number of keys
    /// removed.
    pub fn clear(&self, category: Option<Category>) -> Result<u64> {
        let pattern = match category {
            Some(c) => format!("llm_cache_{}:*", c.as_str()),
            None => "llm_cache_*".to_string(),
        };

        let mut removed = 0u64;
        let mut cursor = 0u64;
        loop {
            let (next_cursor, keys) = self.store.scan(cursor, &pattern, SCAN_BATCH)?;
            for key in &keys {
                self.store.delete(key)?;
                removed += 1;
            }
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        self.stats.reset();
        Ok(removed)
    }

    pub fn statistics(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Hours a response in `category` would be cached for, for surfacing in
    /// a `cache_miss` control event before the response is known.
    pub fn planned_ttl_hours(&self, category: Category) -> f64 {
        self.ttl_for(category) as f64 / 3600.0
    }

    fn ttl_for(&self, category: Category) -> u64 {
        match category {
            Category::Factual => self.config.factual_ttl_secs,
            Category::News => self.config.news_ttl_secs,
            Category::Opinion => self.config.opinion_ttl_secs,
            Category::NoCache => 0,
        }
    }
}

fn cache_key(message: &str, context: &str, category: Category) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(b"|");
    hasher.update(context.as_bytes());
    hasher.update(b"|");
    hasher.update(category.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("llm_cache_{}:{}", category.as_str(), digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchline_store::sqlite::SqliteStore;

    fn cache() -> ResponseCache {
        let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open(":memory:").unwrap());
        ResponseCache::new(store, CacheConfig::default())
    }

    #[test]
    fn miss_then_hit_after_set() {
        let cache = cache();
        let msg = "How many goals has Haaland scored this season?";
        assert_eq!(cache.get(msg, "").unwrap(), None);
        cache.set(msg, "", "42 goals.").unwrap();
        assert_eq!(cache.get(msg, "").unwrap(), Some("42 goals.".to_string()));
        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.saves, 1);
    }

    #[test]
    fn personalised_messages_never_cache() {
        let cache = cache();
        let msg = "Should I captain Salah this week for my team?";
        cache.set(msg, "", "yes").unwrap();
        assert_eq!(cache.get(msg, "").unwrap(), None);
        let stats = cache.statistics();
        assert_eq!(stats.saves, 0);
        assert_eq!(stats.no_cache, 2);
    }

    #[test]
    fn different_context_yields_different_key() {
        let cache = cache();
        let msg = "What's the latest transfer news today?";
        cache.set(msg, "ctx-a", "from a").unwrap();
        assert_eq!(cache.get(msg, "ctx-b").unwrap(), None);
        assert_eq!(cache.get(msg, "ctx-a").unwrap(), Some("from a".to_string()));
    }

    #[test]
    fn clear_removes_only_matching_category() {
        let cache = cache();
        cache
            .set("How many assists does he have?", "", "factual answer")
            .unwrap();
        cache
            .set("What's the latest news today?", "", "news answer")
            .unwrap();

        let removed = cache.clear(Some(Category::Factual)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            cache.get("How many assists does he have?", "").unwrap(),
            None
        );
        assert_eq!(
            cache.get("What's the latest news today?", "").unwrap(),
            Some("news answer".to_string())
        );
    }

    #[test]
    fn clear_all_resets_statistics() {
        let cache = cache();
        cache
            .set("How many goals has he scored?", "", "a")
            .unwrap();
        cache.get("How many goals has he scored?", "").unwrap();
        cache.clear(None).unwrap();
        let stats = cache.statistics();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.saves, 0);
    }
}

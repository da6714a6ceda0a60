use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::classify::Category;

/// Durable record stored under a cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub response: String,
    pub timestamp: String,
    pub message: String,
    pub context: String,
    pub category: String,
    pub ttl_hours: f64,
}

const MAX_LATENCY_SAMPLES: usize = 512;

/// Process-local cache counters, matching the source's `CacheStatistics`.
#[derive(Default)]
pub struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    saves: AtomicU64,
    errors: AtomicU64,
    no_cache: AtomicU64,
    by_category: dashmap::DashMap<&'static str, AtomicU64>,
    hit_latencies_ms: Mutex<Vec<f64>>,
    miss_latencies_ms: Mutex<Vec<f64>>,
}

impl CacheStatistics {
    pub fn record_hit(&self, category: Category, latency_ms: f64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.bump_category(category);
        push_bounded(&self.hit_latencies_ms, latency_ms);
    }

    pub fn record_miss(&self, category: Category, latency_ms: f64) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.bump_category(category);
        push_bounded(&self.miss_latencies_ms, latency_ms);
    }

    pub fn record_no_cache(&self) {
        self.no_cache.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn bump_category(&self, category: Category) {
        self.by_category
            .entry(category.as_str())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.saves.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.no_cache.store(0, Ordering::Relaxed);
        self.by_category.clear();
        self.hit_latencies_ms.lock().unwrap().clear();
        self.miss_latencies_ms.lock().unwrap().clear();
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses + self.no_cache.load(Ordering::Relaxed);
        CacheStatsSnapshot {
            hits,
            misses,
            saves: self.saves.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            no_cache: self.no_cache.load(Ordering::Relaxed),
            total,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
            by_category: self
                .by_category
                .iter()
                .map(|e| (e.key().to_string(), e.value().load(Ordering::Relaxed)))
                .collect(),
            avg_hit_latency_ms: average(&self.hit_latencies_ms),
            avg_miss_latency_ms: average(&self.miss_latencies_ms),
        }
    }
}

fn push_bounded(samples: &Mutex<Vec<f64>>, value: f64) {
    let mut samples = samples.lock().unwrap();
    if samples.len() >= MAX_LATENCY_SAMPLES {
        samples.remove(0);
    }
    samples.push(value);
}

fn average(samples: &Mutex<Vec<f64>>) -> f64 {
    let samples = samples.lock().unwrap();
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub saves: u64,
    pub errors: u64,
    pub no_cache: u64,
    pub total: u64,
    pub hit_rate: f64,
    pub by_category: HashMap<String, u64>,
    pub avg_hit_latency_ms: f64,
    pub avg_miss_latency_ms: f64,
}

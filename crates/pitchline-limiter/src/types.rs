use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use pitchline_core::types::{Identity, Tier};
use serde::Serialize;

/// Result of a single admission check, returned to the caller and used to
/// populate the `X-RateLimit-*` response headers.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitInfo {
    pub identity: String,
    pub tier: String,
    pub limit: u64,
    pub current_usage: u64,
    pub remaining: u64,
    /// Epoch seconds at which the next sub-window opens.
    pub reset_at: u64,
    pub reset_in_secs: u64,
    pub window_duration_secs: u64,
    /// Set when the store failed and the request was admitted by the
    /// fail-open policy rather than by actually having quota left.
    pub degraded: bool,
}

impl RateLimitInfo {
    pub fn for_identity(identity: &Identity, tier: Tier) -> Self {
        Self {
            identity: identity.as_str().to_string(),
            tier: tier.as_str().to_string(),
            limit: 0,
            current_usage: 0,
            remaining: 0,
            reset_at: 0,
            reset_in_secs: 0,
            window_duration_secs: 0,
            degraded: false,
        }
    }
}

/// Outcome of `RateLimiter::check`.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub allowed: bool,
    pub info: RateLimitInfo,
}

/// Process-local counters. Not persisted — restarting the process resets
/// them, matching the source's in-memory `RateLimitStatistics`.
#[derive(Debug, Default)]
pub struct RateLimitStatisticsInner {
    pub total: AtomicU64,
    pub blocked: AtomicU64,
    pub by_tier_total: dashmap::DashMap<String, AtomicU64>,
    pub by_tier_blocked: dashmap::DashMap<String, AtomicU64>,
}

pub struct RateLimitStatistics {
    inner: RateLimitStatisticsInner,
    start: Instant,
}

impl Default for RateLimitStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStatistics {
    pub fn new() -> Self {
        Self {
            inner: RateLimitStatisticsInner::default(),
            start: Instant::now(),
        }
    }

    pub fn record(&self, tier: &str, allowed: bool) {
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        self.inner
            .by_tier_total
            .entry(tier.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);

        if !allowed {
            self.inner.blocked.fetch_add(1, Ordering::Relaxed);
            self.inner
                .by_tier_blocked
                .entry(tier.to_string())
                .or_default()
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RateLimitStatsSnapshot {
        let total = self.inner.total.load(Ordering::Relaxed);
        let blocked = self.inner.blocked.load(Ordering::Relaxed);
        let block_rate = if total > 0 {
            blocked as f64 / total as f64
        } else {
            0.0
        };

        let by_tier_total: HashMap<String, u64> = self
            .inner
            .by_tier_total
            .iter()
            .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
            .collect();
        let by_tier_blocked: HashMap<String, u64> = self
            .inner
            .by_tier_blocked
            .iter()
            .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
            .collect();

        RateLimitStatsSnapshot {
            total,
            blocked,
            block_rate,
            by_tier_total,
            by_tier_blocked,
            uptime_hours: self.start.elapsed().as_secs_f64() / 3600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatsSnapshot {
    pub total: u64,
    pub blocked: u64,
    pub block_rate: f64,
    pub by_tier_total: HashMap<String, u64>,
    pub by_tier_blocked: HashMap<String, u64>,
    pub uptime_hours: f64,
}

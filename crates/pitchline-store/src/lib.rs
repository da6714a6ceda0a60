pub mod db;
pub mod error;
pub mod sqlite;

pub use error::{Result, StoreError};

/// Abstract key-value store (C1). Mirrors the subset of Redis-style
/// operations the rate limiter, response cache, and conversation memory
/// actually need: string get/set with TTL, hash-field increment/get/delete,
/// key expiration, and cursor-based scan.
///
/// Implementations must be internally synchronized — the trait is shared
/// across components via `Arc` and called concurrently from many tasks.
pub trait KvStore: Send + Sync {
    /// `GET key`. Returns `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SET key value EX ttl_secs`.
    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// `DEL key`.
    fn delete(&self, key: &str) -> Result<()>;

    /// `HINCRBY key field by`. Returns the field's new value.
    fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> Result<i64>;

    /// `HGET key field`. Returns `None` if the field does not exist.
    fn hash_get(&self, key: &str, field: &str) -> Result<Option<i64>>;

    /// `HDEL key field`.
    fn hash_del(&self, key: &str, field: &str) -> Result<()>;

    /// `HKEYS key`. Returns all field names present under `key`.
    fn hash_keys(&self, key: &str) -> Result<Vec<String>>;

    /// `EXPIRE key ttl_secs`. No-op if the key (hash or string) doesn't exist.
    fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;

    /// Cursor-based `SCAN`. `pattern` uses SQL `LIKE` glob semantics (`%`
    /// wildcard). Returns `(next_cursor, matched_keys)`; `next_cursor` is
    /// `0` when the scan is complete. Matches both string and hash keys.
    fn scan(&self, cursor: u64, pattern: &str, count: u64) -> Result<(u64, Vec<String>)>;

    /// Lightweight connectivity probe used by the `/health` route.
    fn ping(&self) -> Result<()>;
}

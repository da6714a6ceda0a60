use rusqlite::Connection;

use crate::error::Result;

/// Initialise the KV-store schema. Idempotent — safe to call on every startup.
///
/// Two tables model the two shapes C1 needs to support: plain string values
/// with an expiry (`set-ex`/`get`), and per-key hash maps with per-field
/// integer counters (`hash-incr-by`) used by the sliding-window rate limiter.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_string (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            expires_at  INTEGER
        ) STRICT;

        CREATE TABLE IF NOT EXISTS kv_hash_field (
            key         TEXT NOT NULL,
            field       TEXT NOT NULL,
            value       INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (key, field)
        ) STRICT;

        CREATE TABLE IF NOT EXISTS kv_hash_expiry (
            key         TEXT PRIMARY KEY,
            expires_at  INTEGER NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}

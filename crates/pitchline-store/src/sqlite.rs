use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::KvStore;

/// Single-node `KvStore` backed by an embedded sqlite database.
///
/// Every operation that touches the DB takes the lock, runs one or two
/// statements, and releases it — the same shape as `SessionManager` and
/// `MemoryManager`'s `Mutex<Connection>` wrapping. There is no separate
/// network hop to fail independently of the process, so `StoreUnavailable`
/// in practice means "the on-disk database rejected a write" rather than a
/// dropped connection; callers (the rate limiter, the cache) still treat it
/// as a transport failure and fail open per their own policies.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        crate::db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        crate::db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let now = self.now();
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv_string WHERE key = ?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        match row {
            Some((_, Some(expires_at))) if expires_at <= now => {
                conn.execute("DELETE FROM kv_string WHERE key = ?1", params![key])?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let expires_at = self.now() + ttl_secs as i64;
        conn.execute(
            "INSERT INTO kv_string (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv_string WHERE key = ?1", params![key])?;
        conn.execute("DELETE FROM kv_hash_field WHERE key = ?1", params![key])?;
        conn.execute("DELETE FROM kv_hash_expiry WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv_hash_field (key, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(key, field) DO UPDATE SET value = value + excluded.value",
            params![key, field, by],
        )?;
        let value: i64 = conn.query_row(
            "SELECT value FROM kv_hash_field WHERE key = ?1 AND field = ?2",
            params![key, field],
            |r| r.get(0),
        )?;
        Ok(value)
    }

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<i64>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM kv_hash_field WHERE key = ?1 AND field = ?2",
                params![key, field],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn hash_del(&self, key: &str, field: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM kv_hash_field WHERE key = ?1 AND field = ?2",
            params![key, field],
        )?;
        Ok(())
    }

    fn hash_keys(&self, key: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let now = self.now();
        let expired = conn
            .query_row(
                "SELECT expires_at FROM kv_hash_expiry WHERE key = ?1",
                params![key],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .map(|expires_at| expires_at <= now)
            .unwrap_or(false);

        if expired {
            conn.execute("DELETE FROM kv_hash_field WHERE key = ?1", params![key])?;
            conn.execute("DELETE FROM kv_hash_expiry WHERE key = ?1", params![key])?;
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare("SELECT field FROM kv_hash_field WHERE key = ?1")?;
        let rows = stmt.query_map(params![key], |r| r.get(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let expires_at = self.now() + ttl_secs as i64;
        conn.execute(
            "UPDATE kv_string SET expires_at = ?2 WHERE key = ?1",
            params![key, expires_at],
        )?;
        conn.execute(
            "INSERT INTO kv_hash_expiry (key, expires_at) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET expires_at = excluded.expires_at",
            params![key, expires_at],
        )?;
        Ok(())
    }

    fn scan(&self, cursor: u64, pattern: &str, count: u64) -> Result<(u64, Vec<String>)> {
        let conn = self.conn.lock().unwrap();
        let like = pattern.replace('*', "%");
        let mut stmt = conn.prepare(
            "SELECT key FROM (
                SELECT key FROM kv_string WHERE key LIKE ?1
                UNION
                SELECT DISTINCT key FROM kv_hash_field WHERE key LIKE ?1
             ) ORDER BY key LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![like, count as i64 + 1, cursor as i64], |r| {
            r.get::<_, String>(0)
        })?;
        let mut keys: Vec<String> = rows.filter_map(|r| r.ok()).collect();

        let next_cursor = if keys.len() as u64 > count {
            keys.pop();
            cursor + count
        } else {
            0
        };
        Ok((next_cursor, keys))
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_ex("foo", "bar", 60).unwrap();
        assert_eq!(store.get("foo").unwrap(), Some("bar".to_string()));
    }

    #[test]
    fn expired_string_reads_as_absent() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_ex("foo", "bar", 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(store.get("foo").unwrap(), None);
    }

    #[test]
    fn hash_incr_and_keys() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.hash_incr_by("rl:u1", "100", 1).unwrap(), 1);
        assert_eq!(store.hash_incr_by("rl:u1", "100", 1).unwrap(), 2);
        store.hash_incr_by("rl:u1", "200", 3).unwrap();
        let mut keys = store.hash_keys("rl:u1").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["100".to_string(), "200".to_string()]);
        store.hash_del("rl:u1", "100").unwrap();
        assert_eq!(store.hash_get("rl:u1", "100").unwrap(), None);
    }

    #[test]
    fn scan_matches_prefix_pattern() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_ex("llm_cache_factual:aaa", "1", 60).unwrap();
        store.set_ex("llm_cache_news:bbb", "1", 60).unwrap();
        store.set_ex("other:ccc", "1", 60).unwrap();
        let (cursor, keys) = store.scan(0, "llm_cache_*", 100).unwrap();
        assert_eq!(cursor, 0);
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn delete_removes_both_shapes() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_ex("a", "1", 60).unwrap();
        store.hash_incr_by("a", "f", 1).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.hash_get("a", "f").unwrap(), None);
    }
}

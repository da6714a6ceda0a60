use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{IngestError, Result};
use crate::types::{Article, EmbeddingStatus, PlayerRow};

/// Initialise the article/player schema in `conn`.
///
/// The full crawler-fed schema is out of scope; this owns exactly the
/// fields C7's tools and C9's worker touch.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS articles (
            id                TEXT    NOT NULL PRIMARY KEY,
            title             TEXT    NOT NULL,
            url               TEXT    NOT NULL,
            content           TEXT    NOT NULL,
            source            TEXT    NOT NULL,
            published_date    TEXT,
            sentiment_score   REAL,
            content_hash      TEXT,
            embedding_status  TEXT    NOT NULL DEFAULT 'pending',
            vector_id         TEXT,
            is_deleted        INTEGER NOT NULL DEFAULT 0
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_articles_status
            ON articles (embedding_status) WHERE is_deleted = 0;

        CREATE TABLE IF NOT EXISTS players (
            id           TEXT NOT NULL PRIMARY KEY,
            name         TEXT NOT NULL,
            position     TEXT,
            team         TEXT,
            status       TEXT,
            nationality  TEXT,
            age          INTEGER
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_players_name ON players (name);
        ",
    )?;
    Ok(())
}

/// `rusqlite`-backed persistence for the two tables the core needs: the
/// embedding pipeline over `articles`, and a name lookup over `players`
/// for the `player_stats` tool.
pub struct ArticleStore {
    conn: Arc<Mutex<Connection>>,
}

impl ArticleStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn get(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.conn.lock().unwrap();
        let id = id.to_string();
        conn.query_row(
            "SELECT id, title, url, content, source, published_date, sentiment_score,
                    content_hash, embedding_status, vector_id, is_deleted
             FROM articles WHERE id = ?1",
            [&id],
            row_to_article,
        )
        .optional()
        .map_err(IngestError::from)
    }

    pub fn mark_processing(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let id_str = id.to_string();
        let current: Option<String> = conn
            .query_row(
                "SELECT embedding_status FROM articles WHERE id = ?1",
                [&id_str],
                |r| r.get(0),
            )
            .optional()?;
        match current.as_deref() {
            None => Err(IngestError::ArticleNotFound { id }),
            Some("processing") => Err(IngestError::AlreadyProcessing { id }),
            Some(_) => {
                conn.execute(
                    "UPDATE articles SET embedding_status = 'processing' WHERE id = ?1",
                    [&id_str],
                )?;
                Ok(())
            }
        }
    }

    pub fn mark_failed(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE articles SET embedding_status = 'failed' WHERE id = ?1",
            [id.to_string()],
        )?;
        Ok(())
    }

    /// Writes the completed embedding result and flips status to `completed`.
    pub fn persist_ingestion_result(
        &self,
        id: i64,
        vector_id: &str,
        content_hash: &str,
        sentiment_score: f64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE articles
             SET vector_id = ?1, content_hash = ?2, sentiment_score = ?3,
                 embedding_status = 'completed'
             WHERE id = ?4",
            params![vector_id, content_hash, sentiment_score, id.to_string()],
        )?;
        Ok(())
    }

    /// Rewrites any article stuck in `processing` back to `pending` —
    /// run once on worker startup to recover from a crash mid-ingestion.
    pub fn reset_stuck_processing(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE articles SET embedding_status = 'pending' WHERE embedding_status = 'processing'",
            [],
        )?;
        Ok(n as u64)
    }

    /// Articles whose embedding is `pending` or `failed`, oldest-id first.
    pub fn list_pending(&self, limit: usize) -> Result<Vec<Article>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, url, content, source, published_date, sentiment_score,
                    content_hash, embedding_status, vector_id, is_deleted
             FROM articles
             WHERE embedding_status IN ('pending', 'failed') AND is_deleted = 0
             ORDER BY id
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([limit as i64], row_to_article)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Case-insensitive substring match over player names.
    pub fn find_players_by_name(&self, name_query: &str) -> Result<Vec<PlayerRow>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", name_query.to_lowercase());
        let mut stmt = conn.prepare(
            "SELECT id, name, position, team, status, nationality, age
             FROM players WHERE LOWER(name) LIKE ?1
             ORDER BY name",
        )?;
        let rows = stmt
            .query_map([&pattern], |row| {
                Ok(PlayerRow {
                    id: row.get::<_, String>(0)?.parse().unwrap_or(0),
                    name: row.get(1)?,
                    position: row.get(2)?,
                    team: row.get(3)?,
                    status: row.get(4)?,
                    nationality: row.get(5)?,
                    age: row.get(6)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn insert_article(&self, article: &Article) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO articles
             (id, title, url, content, source, published_date, sentiment_score,
              content_hash, embedding_status, vector_id, is_deleted)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)
             ON CONFLICT(id) DO UPDATE SET
               title=excluded.title, url=excluded.url, content=excluded.content,
               source=excluded.source, published_date=excluded.published_date",
            params![
                article.id.to_string(),
                article.title,
                article.url,
                article.content,
                article.source,
                article.published_date.map(|d| d.to_rfc3339()),
                article.sentiment_score,
                article.content_hash,
                article.embedding_status.to_string(),
                article.vector_id,
                article.is_deleted as i64,
            ],
        )?;
        Ok(())
    }

    pub fn insert_player(&self, player: &PlayerRow) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO players (id, name, position, team, status, nationality, age)
             VALUES (?1,?2,?3,?4,?5,?6,?7)
             ON CONFLICT(id) DO UPDATE SET
               name=excluded.name, position=excluded.position, team=excluded.team,
               status=excluded.status, nationality=excluded.nationality, age=excluded.age",
            params![
                player.id.to_string(),
                player.name,
                player.position,
                player.team,
                player.status,
                player.nationality,
                player.age,
            ],
        )?;
        Ok(())
    }
}

fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<Article> {
    let status_str: String = row.get(8)?;
    let published: Option<String> = row.get(5)?;
    Ok(Article {
        id: row.get::<_, String>(0)?.parse().unwrap_or(0),
        title: row.get(1)?,
        url: row.get(2)?,
        content: row.get(3)?,
        source: row.get(4)?,
        published_date: published.and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|d| d.with_timezone(&chrono::Utc))
        }),
        sentiment_score: row.get(6)?,
        content_hash: row.get(7)?,
        embedding_status: status_str.parse().unwrap_or(EmbeddingStatus::Pending),
        vector_id: row.get(9)?,
        is_deleted: row.get::<_, i64>(10)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, status: EmbeddingStatus) -> Article {
        Article {
            id,
            title: format!("Article {id}"),
            url: format!("https://example.com/{id}"),
            content: "Some football content about a great victory.".to_string(),
            source: "Example FC News".to_string(),
            published_date: Some(chrono::Utc::now()),
            sentiment_score: None,
            content_hash: None,
            embedding_status: status,
            vector_id: None,
            is_deleted: false,
        }
    }

    #[test]
    fn list_pending_includes_pending_and_failed_only() {
        let store = ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.insert_article(&article(1, EmbeddingStatus::Pending)).unwrap();
        store.insert_article(&article(2, EmbeddingStatus::Completed)).unwrap();
        store.insert_article(&article(3, EmbeddingStatus::Failed)).unwrap();

        let pending = store.list_pending(10).unwrap();
        let ids: Vec<i64> = pending.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn mark_processing_twice_conflicts() {
        let store = ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.insert_article(&article(1, EmbeddingStatus::Pending)).unwrap();
        store.mark_processing(1).unwrap();
        let err = store.mark_processing(1).unwrap_err();
        assert!(matches!(err, IngestError::AlreadyProcessing { id: 1 }));
    }

    #[test]
    fn reset_stuck_processing_reverts_to_pending() {
        let store = ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.insert_article(&article(1, EmbeddingStatus::Processing)).unwrap();
        let reset = store.reset_stuck_processing().unwrap();
        assert_eq!(reset, 1);
        assert_eq!(store.get(1).unwrap().unwrap().embedding_status, EmbeddingStatus::Pending);
    }

    #[test]
    fn find_players_by_name_is_case_insensitive_substring() {
        let store = ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.insert_player(&PlayerRow {
            id: 1,
            name: "Erling Haaland".to_string(),
            position: Some("Forward".to_string()),
            team: Some("Man City".to_string()),
            status: Some("active".to_string()),
            nationality: Some("Norway".to_string()),
            age: Some(24),
        }).unwrap();

        let matches = store.find_players_by_name("haaland").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].team.as_deref(), Some("Man City"));
        assert!(store.find_players_by_name("ronaldo").unwrap().is_empty());
    }
}

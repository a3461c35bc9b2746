use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_rusqlite::Connection;

#[derive(Error, Debug)]
pub enum ContentsDbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("Database connection error: {0}")]
    Connection(String),
}

/// One ingested document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub id: String,
    pub name: String,
    pub chunk_count: usize,
    pub backend: String,
    pub created_at: DateTime<Utc>,
}

/// Bookkeeping for ingested documents. Vectors live in the vector store;
/// this only records what was added and when.
#[derive(Clone)]
pub struct ContentsDb {
    conn: Arc<Connection>,
}

impl ContentsDb {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, ContentsDbError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ContentsDbError::Connection(e.to_string()))?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| ContentsDbError::Connection(e.to_string()))?;
        Self::with_connection(conn).await
    }

    pub async fn in_memory() -> Result<Self, ContentsDbError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| ContentsDbError::Connection(e.to_string()))?;
        Self::with_connection(conn).await
    }

    /// Falls back to an in-memory database when the file cannot be opened.
    pub async fn open_or_in_memory<P: AsRef<Path>>(path: P) -> Result<Self, ContentsDbError> {
        match Self::new(&path).await {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!(
                    "Contents database at {} unavailable ({}), using in-memory database",
                    path.as_ref().display(),
                    e
                );
                Self::in_memory().await
            }
        }
    }

    async fn with_connection(conn: Connection) -> Result<Self, ContentsDbError> {
        let db = Self { conn: Arc::new(conn) };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), ContentsDbError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS contents (
                        id TEXT PRIMARY KEY,
                        name TEXT NOT NULL,
                        chunk_count INTEGER NOT NULL,
                        backend TEXT NOT NULL,
                        created_at TEXT NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_contents_name ON contents(name);",
                )?;
                Ok(())
            })
            .await?;

        info!("Contents database initialized");
        Ok(())
    }

    pub async fn record_content(&self, record: ContentRecord) -> Result<(), ContentsDbError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO contents (id, name, chunk_count, backend, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    // chunk_count is coerced back to INTEGER by column affinity
                    [
                        record.id,
                        record.name,
                        record.chunk_count.to_string(),
                        record.backend,
                        record.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn list_contents(&self) -> Result<Vec<ContentRecord>, ContentsDbError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, chunk_count, backend, created_at
                     FROM contents ORDER BY created_at DESC, name ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows.into_iter().map(into_record).collect())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ContentRecord>, ContentsDbError> {
        let name = name.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, chunk_count, backend, created_at
                     FROM contents WHERE name = ?1 ORDER BY created_at DESC LIMIT 1",
                )?;
                let row = stmt
                    .query_map([&name], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .next()
                    .transpose()?;
                Ok(row)
            })
            .await?;

        Ok(row.map(into_record))
    }
}

fn into_record(
    (id, name, chunk_count, backend, created_at): (String, String, i64, String, String),
) -> ContentRecord {
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    ContentRecord {
        id,
        name,
        chunk_count: chunk_count.max(0) as usize,
        backend,
        created_at,
    }
}

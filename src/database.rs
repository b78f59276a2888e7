use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, params};

use crate::error::{Result, ShareError};
use crate::models::{ClipboardEntry, EntryId};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 8;

/// Durable, ordered log of clipboard entries backed by SQLite.
///
/// Cloning is cheap and every clone shares the same connection pool. Ids come
/// from SQLite's `AUTOINCREMENT`, so they stay unique across restarts and
/// across processes sharing the database file.
#[derive(Clone)]
pub struct ClipboardStore {
    pool: Pool<SqliteConnectionManager>,
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clipboard (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            context TEXT NOT NULL,
            time TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime'))
        )",
        [],
    )?;
    Ok(())
}

impl ClipboardStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // The database file may live in a directory that does not exist yet.
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder().max_size(MAX_CONNECTIONS).build(manager)?;

        init_schema(&*pool.get()?)?;
        tracing::info!(path = %path.display(), "clipboard store opened");

        Ok(Self { pool })
    }

    /// Persist a new entry and return the id SQLite assigned to it.
    pub fn create(&self, context: &str) -> Result<EntryId> {
        if context.is_empty() {
            return Err(ShareError::invalid("context is required"));
        }

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO clipboard (context) VALUES (?1)",
            params![context],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(id, len = context.len(), "clipboard entry created");
        Ok(id)
    }

    pub fn list(&self) -> Result<Vec<ClipboardEntry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, context, time FROM clipboard ORDER BY id ASC")?;

        let entries = stmt
            .query_map([], |row| {
                Ok(ClipboardEntry {
                    id: row.get(0)?,
                    context: row.get(1)?,
                    time: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Remove an entry. Deleting an id that does not exist is not an error.
    pub fn delete(&self, id: EntryId) -> Result<()> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM clipboard WHERE id = ?1", params![id])?;

        if removed == 0 {
            tracing::debug!(id, "clipboard delete matched no entry");
        } else {
            tracing::info!(id, "clipboard entry deleted");
        }
        Ok(())
    }
}

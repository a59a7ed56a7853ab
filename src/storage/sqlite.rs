// src/storage/sqlite.rs — SQLite-backed definition store
//
// Each call opens its own connection against a WAL-mode database, so readers
// never wait on each other and a writer only briefly holds SQLite's write lock.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::schema;
use super::DefinitionStore;
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::errors::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteDefinitionStore {
    path: PathBuf,
    namespace: String,
}

impl SqliteDefinitionStore {
    /// Open (or create) the database at `path` and bring its schema up to date.
    pub fn open(path: &Path, namespace: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let store = Self {
            path: path.to_path_buf(),
            namespace: namespace.to_string(),
        };
        let conn = store.connect()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        schema::run_migrations(&conn)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Stored digest and last write time, without loading the body.
    pub fn entry_info(&self, id: &Identifier) -> Result<Option<(String, String)>, StoreError> {
        let conn = self.connect()?;
        let info = conn
            .query_row(
                "SELECT sha256, updated_at FROM definitions WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(info)
    }
}

impl DefinitionStore for SqliteDefinitionStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self, id: &Identifier) -> Result<Option<DefinitionBlob>, StoreError> {
        let conn = self.connect()?;
        let body: Option<Vec<u8>> = conn
            .query_row(
                "SELECT body FROM definitions WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body.map(DefinitionBlob::from_bytes))
    }

    fn write(&self, id: &Identifier, blob: &DefinitionBlob) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO definitions (namespace, id, body, sha256, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(namespace, id) DO UPDATE SET
                body = excluded.body,
                sha256 = excluded.sha256,
                updated_at = excluded.updated_at",
            params![
                self.namespace,
                id.as_str(),
                blob.as_bytes(),
                blob.digest(),
                now
            ],
        )?;
        Ok(())
    }

    fn remove(&self, id: &Identifier) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "DELETE FROM definitions WHERE namespace = ?1 AND id = ?2",
            params![self.namespace, id.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "DELETE FROM definitions WHERE namespace = ?1",
            params![self.namespace],
        )?;
        Ok(changed)
    }

    fn ids(&self) -> Result<Vec<Identifier>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id FROM definitions WHERE namespace = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![self.namespace], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for row in rows {
            let raw = row?;
            match Identifier::parse(raw.clone()) {
                Ok(id) => result.push(id),
                Err(_) => tracing::debug!("Skipping invalid stored identifier {raw:?}"),
            }
        }
        Ok(result)
    }
}

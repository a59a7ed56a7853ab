// src/storage/mod.rs — Definition store: identifier -> raw definition blob

pub mod file;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::config::{StoreBackend, StoreConfig};
use crate::infra::errors::StoreError;

pub use file::FileDefinitionStore;
pub use memory::MemoryDefinitionStore;
pub use sqlite::SqliteDefinitionStore;

/// Keyed persistence for script definitions.
///
/// Writes are last-write-wins per identifier and visible to `read` as soon as
/// `write` returns. A miss is `Ok(None)`, never an error. Calls are blocking;
/// the engine runs them on the blocking pool.
pub trait DefinitionStore: Send + Sync {
    /// Short backend name for logs and status output.
    fn backend(&self) -> &'static str;

    fn read(&self, id: &Identifier) -> Result<Option<DefinitionBlob>, StoreError>;

    fn write(&self, id: &Identifier, blob: &DefinitionBlob) -> Result<(), StoreError>;

    /// Returns whether an entry existed.
    fn remove(&self, id: &Identifier) -> Result<bool, StoreError>;

    /// Drop every entry in this store's namespace. Returns how many went.
    fn clear(&self) -> Result<usize, StoreError>;

    /// Identifiers currently stored, sorted.
    fn ids(&self) -> Result<Vec<Identifier>, StoreError>;
}

/// Open the backend selected in the config.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DefinitionStore>, StoreError> {
    let store: Arc<dyn DefinitionStore> = match config.backend {
        StoreBackend::File => Arc::new(FileDefinitionStore::open(
            config.resolved_path(),
            &config.namespace,
        )?),
        StoreBackend::Sqlite => Arc::new(SqliteDefinitionStore::open(
            &config.resolved_path(),
            &config.namespace,
        )?),
        StoreBackend::Memory => Arc::new(MemoryDefinitionStore::new()),
    };
    tracing::debug!(backend = store.backend(), "Definition store opened");
    Ok(store)
}

/// `read` on the blocking pool.
pub async fn read_async(
    store: Arc<dyn DefinitionStore>,
    id: Identifier,
) -> Result<Option<DefinitionBlob>, StoreError> {
    tokio::task::spawn_blocking(move || store.read(&id))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

/// `write` on the blocking pool.
pub async fn write_async(
    store: Arc<dyn DefinitionStore>,
    id: Identifier,
    blob: DefinitionBlob,
) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || store.write(&id, &blob))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_per_backend() {
        let dir = TempDir::new().unwrap();

        let file = open_store(&StoreConfig {
            backend: StoreBackend::File,
            path: Some(dir.path().join("defs")),
            namespace: "tse-def".into(),
        })
        .unwrap();
        assert_eq!(file.backend(), "file");

        let sqlite = open_store(&StoreConfig {
            backend: StoreBackend::Sqlite,
            path: Some(dir.path().join("defs.db")),
            namespace: "tse-def".into(),
        })
        .unwrap();
        assert_eq!(sqlite.backend(), "sqlite");

        let memory = open_store(&StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        })
        .unwrap();
        assert_eq!(memory.backend(), "memory");
    }

    #[tokio::test]
    async fn test_async_helpers_roundtrip() {
        let store: Arc<dyn DefinitionStore> = Arc::new(MemoryDefinitionStore::new());
        let id = Identifier::parse("0x0000").unwrap();
        write_async(store.clone(), id.clone(), "Testing write".into())
            .await
            .unwrap();
        let blob = read_async(store, id).await.unwrap().unwrap();
        assert_eq!(blob.as_text(), Some("Testing write"));
    }
}

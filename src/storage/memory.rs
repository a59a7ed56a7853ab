// src/storage/memory.rs — In-process definition store

use std::collections::HashMap;
use std::sync::RwLock;

use super::DefinitionStore;
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::errors::StoreError;

/// Volatile store for tests and ephemeral engines. Readers share the lock;
/// writers hold it only for the map insert.
#[derive(Default)]
pub struct MemoryDefinitionStore {
    entries: RwLock<HashMap<Identifier, DefinitionBlob>>,
}

impl MemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DefinitionStore for MemoryDefinitionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn read(&self, id: &Identifier) -> Result<Option<DefinitionBlob>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(id).cloned())
    }

    fn write(&self, id: &Identifier, blob: &DefinitionBlob) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(id.clone(), blob.clone());
        Ok(())
    }

    fn remove(&self, id: &Identifier) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(id).is_some())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    fn ids(&self) -> Result<Vec<Identifier>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<Identifier> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    #[test]
    fn test_read_miss_is_none() {
        let store = MemoryDefinitionStore::new();
        assert!(store.read(&id("0xmissing")).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_and_remove() {
        let store = MemoryDefinitionStore::new();
        store.write(&id("0x1"), &"A".into()).unwrap();
        store.write(&id("0x1"), &"B".into()).unwrap();
        assert_eq!(store.read(&id("0x1")).unwrap().unwrap().as_text(), Some("B"));
        assert_eq!(store.len(), 1);

        assert!(store.remove(&id("0x1")).unwrap());
        assert!(!store.remove(&id("0x1")).unwrap());
    }

    #[test]
    fn test_ids_sorted_and_clear() {
        let store = MemoryDefinitionStore::new();
        store.write(&id("0xb"), &"b".into()).unwrap();
        store.write(&id("0xa"), &"a".into()).unwrap();
        assert_eq!(store.ids().unwrap(), vec![id("0xa"), id("0xb")]);
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.ids().unwrap().is_empty());
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryDefinitionStore::new());
        store.write(&id("0x1"), &"one".into()).unwrap();
        store.write(&id("0x2"), &"two".into()).unwrap();

        let poisoner = store.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert!(matches!(store.read(&id("0x1")), Err(StoreError::Poisoned)));
    }
}

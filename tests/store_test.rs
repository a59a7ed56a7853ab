// tests/store_test.rs — Integration test: definition store contract on every backend

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use tsengine::core::types::{DefinitionBlob, Identifier};
use tsengine::infra::config::{StoreBackend, StoreConfig};
use tsengine::storage::{
    open_store, read_async, write_async, DefinitionStore, FileDefinitionStore,
    MemoryDefinitionStore, SqliteDefinitionStore,
};

/// One instance of each backend; the TempDir must outlive the stores.
fn backends() -> (TempDir, Vec<Arc<dyn DefinitionStore>>) {
    let dir = TempDir::new().unwrap();
    let stores: Vec<Arc<dyn DefinitionStore>> = vec![
        Arc::new(MemoryDefinitionStore::new()),
        Arc::new(FileDefinitionStore::open(dir.path().join("files"), "tse-def").unwrap()),
        Arc::new(SqliteDefinitionStore::open(&dir.path().join("defs.db"), "tse-def").unwrap()),
    ];
    (dir, stores)
}

fn id(raw: &str) -> Identifier {
    Identifier::parse(raw).unwrap()
}

#[test]
fn test_write_then_read_roundtrip() {
    let (_dir, stores) = backends();
    for store in stores {
        store.write(&id("0x0000"), &"Testing write".into()).unwrap();
        let blob = store.read(&id("0x0000")).unwrap();
        assert_eq!(
            blob.as_ref().and_then(|b| b.as_text()),
            Some("Testing write"),
            "backend {}",
            store.backend()
        );
    }
}

#[test]
fn test_overwrite_keeps_last_value() {
    let (_dir, stores) = backends();
    for store in stores {
        store.write(&id("0x0000"), &"A".into()).unwrap();
        store.write(&id("0x0000"), &"B".into()).unwrap();
        assert_eq!(
            store.read(&id("0x0000")).unwrap(),
            Some(DefinitionBlob::from("B")),
            "backend {}",
            store.backend()
        );
        assert_eq!(store.ids().unwrap(), vec![id("0x0000")]);
    }
}

#[test]
fn test_miss_is_not_an_error() {
    let (_dir, stores) = backends();
    for store in stores {
        assert!(
            store.read(&id("0xffff")).unwrap().is_none(),
            "backend {}",
            store.backend()
        );
        assert!(!store.remove(&id("0xffff")).unwrap());
    }
}

#[test]
fn test_identifiers_are_case_sensitive() {
    let (_dir, stores) = backends();
    for store in stores {
        store.write(&id("0xabc"), &"lower".into()).unwrap();
        store.write(&id("0xABC"), &"upper".into()).unwrap();
        assert_eq!(
            store.read(&id("0xabc")).unwrap().unwrap().as_text(),
            Some("lower"),
            "backend {}",
            store.backend()
        );
        assert_eq!(
            store.read(&id("0xABC")).unwrap().unwrap().as_text(),
            Some("upper")
        );
    }
}

#[test]
fn test_long_identifier_roundtrip() {
    let (_dir, stores) = backends();
    let long = id(&format!("0x{}", "ab".repeat(150)));
    let other = id(&format!("0x{}", "cd".repeat(150)));
    for store in stores {
        store.write(&long, &"<ts:token/>".into()).unwrap();
        assert_eq!(
            store.read(&long).unwrap(),
            Some(DefinitionBlob::from("<ts:token/>")),
            "backend {}",
            store.backend()
        );
        assert!(store.read(&other).unwrap().is_none());
        assert_eq!(store.ids().unwrap(), vec![long.clone()]);
        assert!(store.remove(&long).unwrap());
        assert!(store.read(&long).unwrap().is_none());
    }
}

#[test]
fn test_remove_clear_and_list() {
    let (_dir, stores) = backends();
    for store in stores {
        for raw in ["0x3", "0x1", "0x2"] {
            store.write(&id(raw), &raw.into()).unwrap();
        }
        let mut ids = store.ids().unwrap();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(ids, vec![id("0x1"), id("0x2"), id("0x3")]);

        assert!(store.remove(&id("0x2")).unwrap());
        assert!(store.read(&id("0x2")).unwrap().is_none());
        assert_eq!(store.clear().unwrap(), 2, "backend {}", store.backend());
        assert!(store.ids().unwrap().is_empty());
    }
}

#[test]
fn test_concurrent_writes_to_distinct_keys() {
    let (_dir, stores) = backends();
    for store in stores {
        let workers: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let key = id(&format!("0x{i:04x}"));
                    store
                        .write(&key, &DefinitionBlob::from_text(format!("def-{i}")))
                        .unwrap();
                    store.read(&key).unwrap().unwrap()
                })
            })
            .collect();

        for (i, worker) in workers.into_iter().enumerate() {
            let blob = worker.join().unwrap();
            assert_eq!(blob.as_text(), Some(format!("def-{i}").as_str()));
        }
        assert_eq!(store.ids().unwrap().len(), 16, "backend {}", store.backend());
    }
}

#[test]
fn test_concurrent_writes_to_same_key_leave_one_whole_value() {
    let (_dir, stores) = backends();
    for store in stores {
        let candidates: Vec<String> = (0..8).map(|i| format!("{i}").repeat(4096)).collect();
        let workers: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|body| {
                let store = store.clone();
                thread::spawn(move || store.write(&id("0xsame"), &body.as_str().into()).unwrap())
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stored = store.read(&id("0xsame")).unwrap().unwrap();
        let text = stored.as_text().unwrap().to_string();
        assert!(
            candidates.contains(&text),
            "backend {} stored a torn value",
            store.backend()
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_helpers_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&StoreConfig {
        backend: StoreBackend::Sqlite,
        path: Some(dir.path().join("defs.db")),
        namespace: "tse-def".into(),
    })
    .unwrap();

    write_async(store.clone(), id("0x0000"), "Testing write".into())
        .await
        .unwrap();
    let blob = read_async(store, id("0x0000")).await.unwrap();
    assert_eq!(blob, Some(DefinitionBlob::from("Testing write")));
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("files");
    FileDefinitionStore::open(&root, "tse-def")
        .unwrap()
        .write(&id("0xd0d0"), &"<ts:token/>".into())
        .unwrap();

    let reopened = FileDefinitionStore::open(&root, "tse-def").unwrap();
    assert_eq!(
        reopened.read(&id("0xd0d0")).unwrap(),
        Some(DefinitionBlob::from("<ts:token/>"))
    );
}

#[test]
fn test_file_store_long_identifier_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("files");
    let long = id(&"t".repeat(1000));
    FileDefinitionStore::open(&root, "tse-def")
        .unwrap()
        .write(&long, &"line one\nline two".into())
        .unwrap();

    let reopened = FileDefinitionStore::open(&root, "tse-def").unwrap();
    assert_eq!(
        reopened.read(&long).unwrap(),
        Some(DefinitionBlob::from("line one\nline two"))
    );
    assert_eq!(reopened.ids().unwrap(), vec![long]);
}

// src/cli/definition.rs — `tsengine definition`: local store maintenance

use std::io::Write;

use anyhow::Context;

use super::DefinitionAction;
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::config::Config;
use crate::storage::{open_store, DefinitionStore};

pub async fn run_definition(config: &Config, action: DefinitionAction) -> anyhow::Result<()> {
    let store = open_store(&config.store).context("Cannot open the definition store")?;
    tokio::task::spawn_blocking(move || apply(store.as_ref(), action)).await?
}

fn apply(store: &dyn DefinitionStore, action: DefinitionAction) -> anyhow::Result<()> {
    match action {
        DefinitionAction::Get { id } => {
            let id = Identifier::parse(id)?;
            let Some(blob) = store.read(&id)? else {
                anyhow::bail!("No stored definition for {id}");
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(blob.as_bytes())?;
            if !blob.as_bytes().ends_with(b"\n") {
                writeln!(stdout)?;
            }
        }
        DefinitionAction::Put { id, file } => {
            let id = Identifier::parse(id)?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let blob = DefinitionBlob::from_bytes(bytes);
            store.write(&id, &blob)?;
            println!("Stored {id} ({} bytes, sha256 {})", blob.len(), blob.digest());
        }
        DefinitionAction::Remove { id } => {
            let id = Identifier::parse(id)?;
            if store.remove(&id)? {
                println!("Removed {id}");
            } else {
                println!("{id} was not stored");
            }
        }
        DefinitionAction::List => {
            let ids = store.ids()?;
            if ids.is_empty() {
                println!("No stored definitions.");
            }
            for id in ids {
                println!("{id}");
            }
        }
        DefinitionAction::Clear => {
            let removed = store.clear()?;
            println!("Removed {removed} definition(s).");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDefinitionStore;
    use tempfile::TempDir;

    #[test]
    fn test_put_then_remove() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("def.tsml");
        std::fs::write(&file, "<ts:token/>").unwrap();
        let store = MemoryDefinitionStore::new();

        apply(
            &store,
            DefinitionAction::Put {
                id: "0x1".into(),
                file,
            },
        )
        .unwrap();
        let id = Identifier::parse("0x1").unwrap();
        assert_eq!(store.read(&id).unwrap().unwrap().as_text(), Some("<ts:token/>"));

        apply(&store, DefinitionAction::Remove { id: "0x1".into() }).unwrap();
        assert!(store.read(&id).unwrap().is_none());
    }

    #[test]
    fn test_get_missing_fails() {
        let store = MemoryDefinitionStore::new();
        let err = apply(&store, DefinitionAction::Get { id: "0x9".into() }).unwrap_err();
        assert!(err.to_string().contains("No stored definition"));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let store = MemoryDefinitionStore::new();
        assert!(apply(&store, DefinitionAction::Remove { id: "".into() }).is_err());
    }
}

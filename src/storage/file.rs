// src/storage/file.rs — One file per definition under a namespace directory
//
// Layout: {root}/{namespace}/{hex(identifier)}.tsml
// The identifier is hex-encoded so that keys differing only in case stay
// distinct on case-insensitive filesystems. Identifiers too long for a hex
// file name are stored as h-{sha256(identifier)}.tsml, and the file starts
// with the identifier and a newline. Writes go to a temp file that is synced
// and renamed over the target, so readers see the old or the new blob, never
// a torn one.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use super::DefinitionStore;
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::errors::StoreError;

const EXTENSION: &str = "tsml";

/// Longest hex stem used verbatim; keeps `{stem}.tsml` well under the usual
/// 255-byte file name limit.
const MAX_HEX_STEM: usize = 200;

const HASHED_PREFIX: &str = "h-";

pub struct FileDefinitionStore {
    dir: PathBuf,
    write_locks: KeyLocks,
}

impl FileDefinitionStore {
    /// Open (creating if needed) the namespace directory under `root`.
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(namespace);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            write_locks: KeyLocks::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, id: &Identifier) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", file_stem(id)))
    }

    fn entry_files(&self) -> Result<Vec<(PathBuf, Option<Identifier>)>, StoreError> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in read_dir {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if stem.starts_with(HASHED_PREFIX) => read_header(&path, stem),
                Some(stem) => decode_file_stem(stem),
                None => None,
            };
            files.push((path, id));
        }
        Ok(files)
    }
}

fn is_hashed(id: &Identifier) -> bool {
    id.as_str().len() * 2 > MAX_HEX_STEM
}

fn id_digest(id: &Identifier) -> String {
    hex::encode(Sha256::digest(id.as_str().as_bytes()))
}

fn file_stem(id: &Identifier) -> String {
    if is_hashed(id) {
        format!("{HASHED_PREFIX}{}", id_digest(id))
    } else {
        hex::encode(id.as_str())
    }
}

fn decode_file_stem(stem: &str) -> Option<Identifier> {
    let bytes = hex::decode(stem).ok()?;
    let raw = String::from_utf8(bytes).ok()?;
    let id = Identifier::parse(raw).ok()?;
    (!is_hashed(&id)).then_some(id)
}

/// Identifier recorded in the first line of a hashed entry, if it matches
/// the file name.
fn read_header(path: &Path, stem: &str) -> Option<Identifier> {
    let file = fs::File::open(path).ok()?;
    let mut line = Vec::new();
    BufReader::new(file).read_until(b'\n', &mut line).ok()?;
    let (id, _) = split_header(&line)?;
    (file_stem(&id) == stem).then_some(id)
}

/// Split `{identifier}\n{body}`. Identifiers never contain control
/// characters, so the first newline ends the header.
fn split_header(bytes: &[u8]) -> Option<(Identifier, &[u8])> {
    let end = bytes.iter().position(|b| *b == b'\n')?;
    let raw = std::str::from_utf8(&bytes[..end]).ok()?;
    let id = Identifier::parse(raw).ok()?;
    Some((id, &bytes[end + 1..]))
}

impl DefinitionStore for FileDefinitionStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn read(&self, id: &Identifier) -> Result<Option<DefinitionBlob>, StoreError> {
        let path = self.entry_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        if !is_hashed(id) {
            return Ok(Some(DefinitionBlob::from_bytes(bytes)));
        }
        match split_header(&bytes) {
            Some((stored, body)) if &stored == id => {
                Ok(Some(DefinitionBlob::from_bytes(body.to_vec())))
            }
            _ => {
                tracing::warn!("{} does not belong to {id}, treating as a miss", path.display());
                Ok(None)
            }
        }
    }

    fn write(&self, id: &Identifier, blob: &DefinitionBlob) -> Result<(), StoreError> {
        let path = self.entry_path(id);
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            &id_digest(id)[..16],
            uuid::Uuid::new_v4().simple()
        ));
        let header = if is_hashed(id) {
            format!("{id}\n")
        } else {
            String::new()
        };

        let lock = self.write_locks.acquire(id)?;
        let result = {
            let _guard = lock.lock().map_err(|_| StoreError::Poisoned)?;
            write_synced(&tmp, header.as_bytes(), blob.as_bytes())
                .and_then(|()| fs::rename(&tmp, &path))
                .map_err(|e| StoreError::io(&path, e))
        };
        self.write_locks.release(id, lock);

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn remove(&self, id: &Identifier) -> Result<bool, StoreError> {
        let path = self.entry_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for (path, id) in self.entry_files()? {
            if id.is_none() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
        Ok(removed)
    }

    fn ids(&self) -> Result<Vec<Identifier>, StoreError> {
        let mut ids = Vec::new();
        for (path, id) in self.entry_files()? {
            match id {
                Some(id) => ids.push(id),
                None => tracing::debug!("Ignoring foreign file {}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn write_synced(path: &Path, header: &[u8], body: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(path)?;
    f.write_all(header)?;
    f.write_all(body)?;
    f.sync_all()
}

/// Per-identifier write locks. Entries are dropped once no writer holds them.
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<Identifier, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn acquire(&self, id: &Identifier) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self.locks.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(locks.entry(id.clone()).or_default().clone())
    }

    fn release(&self, id: &Identifier, lock: Arc<Mutex<()>>) {
        drop(lock);
        if let Ok(mut locks) = self.locks.lock() {
            if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
                locks.remove(id);
            }
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

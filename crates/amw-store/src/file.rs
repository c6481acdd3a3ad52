//! # JSON File Repository
//!
//! One collection per file, stored as a pretty-printed JSON array. Writes go
//! to a sibling `.tmp` file that is then renamed over the target, so a crash
//! mid-write leaves the previous contents intact.
//!
//! Loading is forgiving: a missing file is an empty collection, and an
//! unreadable or malformed one is logged and treated as empty.
//!
//! Updates are not. A single record that fails to deserialize makes the
//! whole file invalid, and it may still hold other holders' private keys.
//! Before `save` or `remove` writes, an invalid file is renamed to
//! `<name>.json.corrupt` (or `.corrupt.<n>` if that exists) so nothing on
//! disk is lost. An unreadable file fails the update with
//! [`StoreError::Io`].

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{upsert, Keyed, Repository, StoreError};

pub struct JsonFileRepository<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for JsonFileRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileRepository")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> JsonFileRepository<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> JsonFileRepository<T>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    fn contents(&self) -> Contents<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Contents::Records(Vec::new())
            }
            Err(e) => return Contents::Unreadable(e),
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Contents::Records(items),
            Err(e) => Contents::Invalid(e),
        }
    }

    fn read(&self) -> Vec<T> {
        match self.contents() {
            Contents::Records(items) => items,
            Contents::Unreadable(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file unreadable, loading empty");
                Vec::new()
            }
            Contents::Invalid(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file invalid, loading empty");
                Vec::new()
            }
        }
    }

    /// Current records for a read-modify-write. Never returns an empty list
    /// standing in for a file that still exists.
    fn read_for_update(&self) -> Result<Vec<T>, StoreError> {
        match self.contents() {
            Contents::Records(items) => Ok(items),
            Contents::Unreadable(e) => Err(StoreError::io(&self.path, e)),
            Contents::Invalid(e) => {
                let aside = self.quarantine_path();
                fs::rename(&self.path, &aside).map_err(|e| StoreError::io(&aside, e))?;
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "store file invalid, moved aside before writing"
                );
                Ok(Vec::new())
            }
        }
    }

    fn quarantine_path(&self) -> PathBuf {
        let first = self.path.with_extension("json.corrupt");
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| self.path.with_extension(format!("json.corrupt.{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    fn write(&self, items: &[T]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), records = items.len(), "store written");
        Ok(())
    }
}

enum Contents<T> {
    Records(Vec<T>),
    Unreadable(std::io::Error),
    Invalid(serde_json::Error),
}

impl<T> Repository<T> for JsonFileRepository<T>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    fn save(&self, item: T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut items = self.read_for_update()?;
        upsert(&mut items, item);
        self.write(&items)
    }

    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.read())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut items = self.read_for_update()?;
        let before = items.len();
        items.retain(|item| item.key() != key);
        if items.len() == before {
            return Ok(false);
        }
        self.write(&items)?;
        Ok(true)
    }
}

//! # amw-store — Wallet Persistence
//!
//! Two collections live in a wallet: identities and stored credentials.
//! Both are keyed by an id (the DID, the credential id) with upsert
//! semantics: saving a record whose key already exists replaces it in place.
//!
//! [`Repository`] is the seam. [`InMemoryRepository`] backs tests and
//! ephemeral sessions; [`JsonFileRepository`] keeps one JSON array per
//! collection on disk (`dids.json`, `credentials.json`). A file that cannot
//! be read or parsed loads as an empty collection with a warning, so a
//! corrupted store never prevents the wallet from starting. Writes never
//! replace such a file; see [`file`].

pub mod error;
pub mod file;
pub mod memory;

use std::path::{Path, PathBuf};

use amw_did::Identity;
use amw_vc::StoredCredential;

pub use error::StoreError;
pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;

/// A record with a stable string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Identity {
    fn key(&self) -> &str {
        self.id().as_str()
    }
}

impl Keyed for StoredCredential {
    fn key(&self) -> &str {
        self.id().as_str()
    }
}

/// Keyed collection with upsert semantics.
pub trait Repository<T: Keyed>: Send + Sync {
    /// Insert `item`, or replace the record with the same key in place.
    fn save(&self, item: T) -> Result<(), StoreError>;

    /// Every record, in insertion order.
    fn load_all(&self) -> Result<Vec<T>, StoreError>;

    /// Remove the record with `key`. Returns `false` if there was none.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.load_all()?.into_iter().find(|item| item.key() == key))
    }
}

/// Replace-or-append on a vector of keyed records.
pub(crate) fn upsert<T: Keyed>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.key() == item.key()) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

/// Both wallet collections under one data directory.
#[derive(Debug)]
pub struct WalletStore {
    root: PathBuf,
    pub identities: JsonFileRepository<Identity>,
    pub credentials: JsonFileRepository<StoredCredential>,
}

impl WalletStore {
    pub const IDENTITIES_FILE: &'static str = "dids.json";
    pub const CREDENTIALS_FILE: &'static str = "credentials.json";

    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            identities: JsonFileRepository::new(root.join(Self::IDENTITIES_FILE)),
            credentials: JsonFileRepository::new(root.join(Self::CREDENTIALS_FILE)),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

//! # amw-cli — Amatelus Wallet Command Line
//!
//! ## Subcommands
//!
//! - `amw did`: identity generation, listing, public identity QR payload,
//!   nonce signing and proof-of-possession checks.
//! - `amw vc`: sample credentials, listing, chunked transport split and
//!   receive.
//! - `amw zkp`: age predicate proofs bound to a verifier's challenge, and
//!   verifier-side payload checks.
//!
//! Handlers print to stdout and return a process exit code. Business logic
//! stays in the library crates.

pub mod config;
pub mod did;
pub mod vc;
pub mod zkp;

use anyhow::{Context, Result};

use amw_did::Identity;
use amw_store::{Repository, WalletStore};
use amw_vc::StoredCredential;

pub use config::WalletConfig;

/// Resolved configuration plus the store it points at.
#[derive(Debug)]
pub struct WalletContext {
    pub config: WalletConfig,
    pub store: WalletStore,
}

impl WalletContext {
    pub fn new(config: WalletConfig) -> Self {
        let store = WalletStore::open(&config.data_dir);
        Self { config, store }
    }

    pub fn identity(&self, did: &str) -> Result<Identity> {
        self.store
            .identities
            .get(did)
            .context("loading identities")?
            .with_context(|| format!("no identity {did} in wallet"))
    }

    pub fn credential(&self, id: &str) -> Result<StoredCredential> {
        self.store
            .credentials
            .get(id)
            .context("loading credentials")?
            .with_context(|| format!("no credential {id} in wallet"))
    }
}

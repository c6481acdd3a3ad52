use amw_core::{CanonicalizationError, ValidationError};
use amw_crypto::CryptoError;
use thiserror::Error;

/// Errors from building, loading, or presenting an identity.
#[derive(Error, Debug)]
pub enum DidError {
    /// Public key bytes are structurally invalid (wrong length or encoding).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Key generation or private key import failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A stored document does not match the document rebuilt from its key.
    #[error("document {found} is not the content address of its key (expected {expected})")]
    ContentAddressMismatch { expected: String, found: String },

    /// The private key does not belong to the stored public key.
    #[error("private key does not match public key {0}")]
    KeyMismatch(String),

    /// A scanned public identity payload could not be parsed.
    #[error("invalid public identity payload: {0}")]
    InvalidPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

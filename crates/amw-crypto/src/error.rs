//! Errors from key handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key bytes have the wrong length or do not form a valid key.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Signature bytes have the wrong length.
    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// The OS random source failed. Fatal for key generation.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

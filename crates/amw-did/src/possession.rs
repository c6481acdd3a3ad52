//! # Public Identity Payload and Proof of Possession
//!
//! A holder shows `[1, "<publicKey>"]` as a QR code. A verifier that wants
//! proof the holder controls the key shows a nonce; the holder signs the
//! nonce's UTF-8 bytes and presents `{"nonce", "signature", "publicKey"}`.

use serde::{Deserialize, Serialize};

use amw_crypto::{PublicKey, Signature};

use crate::error::DidError;
use crate::identity::Identity;

pub const PUBLIC_IDENTITY_VERSION: u32 = 1;

/// Render the public identity QR payload.
pub fn format_public_identity(public_key: &PublicKey) -> String {
    // Base64 has no characters that need JSON escaping.
    format!("[{PUBLIC_IDENTITY_VERSION},\"{}\"]", public_key.to_base64())
}

/// Parse a scanned public identity payload.
///
/// # Errors
///
/// [`DidError::InvalidPayload`] if the text is not a `[version, key]` pair,
/// names an unknown version, or carries a malformed key.
pub fn parse_public_identity(raw: &str) -> Result<PublicKey, DidError> {
    let (version, key): (u32, String) = serde_json::from_str(raw.trim())
        .map_err(|e| DidError::InvalidPayload(e.to_string()))?;
    if version != PUBLIC_IDENTITY_VERSION {
        return Err(DidError::InvalidPayload(format!(
            "unsupported version {version}"
        )));
    }
    PublicKey::from_base64(&key).map_err(|e| DidError::InvalidPayload(e.to_string()))
}

/// A signed nonce presented to a verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossessionResponse {
    pub nonce: String,
    pub signature: Signature,
    pub public_key: PublicKey,
}

impl PossessionResponse {
    /// Sign `nonce` with the identity's private key.
    pub fn respond(identity: &Identity, nonce: &str) -> Result<Self, DidError> {
        let signature = identity.sign(nonce.as_bytes())?;
        Ok(Self {
            nonce: nonce.to_string(),
            signature,
            public_key: *identity.public_key(),
        })
    }

    /// `true` iff the signature covers the nonce under the presented key.
    pub fn verify(&self) -> bool {
        self.public_key.verify(self.nonce.as_bytes(), &self.signature)
    }

    /// Like [`verify`](Self::verify), and the key must be the one the
    /// verifier expected (e.g. scanned earlier from the public identity QR).
    pub fn verify_against(&self, expected: &PublicKey) -> bool {
        self.public_key == *expected && self.verify()
    }

    /// `true` iff this response answers `nonce`.
    pub fn answers(&self, nonce: &str) -> bool {
        self.nonce == nonce && self.verify()
    }
}

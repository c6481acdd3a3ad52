//! # Wallet Identity
//!
//! The holder's DID material as persisted: `{privateKey, publicKey, doc}`.
//! Keys never change after minting; rotating means minting a new identity.
//!
//! Deserialization re-checks the record. The private key must import, must
//! belong to `publicKey`, and `doc` must be the content address of that key.
//! A tampered store entry is rejected instead of loaded.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use amw_core::Did;
use amw_crypto::{KeyPair, PublicKey, Signature};

use crate::document::{build_for_key, DidDocument};
use crate::error::DidError;
use crate::possession::format_public_identity;

/// DID material held by the wallet.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "IdentityRecord", into = "IdentityRecord")]
pub struct Identity {
    private_key: Zeroizing<String>,
    public_key: PublicKey,
    document: DidDocument,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    private_key: String,
    public_key: PublicKey,
    doc: DidDocument,
}

impl Identity {
    /// Mint a fresh identity from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// [`DidError::Crypto`] if the entropy source fails.
    pub fn generate() -> Result<Self, DidError> {
        let keypair = KeyPair::generate()?;
        let identity = Self::from_keypair(&keypair)?;
        tracing::info!(did = %identity.id(), "generated identity");
        Ok(identity)
    }

    pub fn from_keypair(keypair: &KeyPair) -> Result<Self, DidError> {
        let public_key = keypair.public_key();
        let document = build_for_key(&public_key)?;
        Ok(Self {
            private_key: keypair.secret_base64(),
            public_key,
            document,
        })
    }

    pub fn id(&self) -> &Did {
        &self.document.id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn document(&self) -> &DidDocument {
        &self.document
    }

    /// Re-import the signing key.
    pub fn keypair(&self) -> Result<KeyPair, DidError> {
        Ok(KeyPair::from_secret_base64(&self.private_key)?)
    }

    pub fn sign(&self, message: &[u8]) -> Result<Signature, DidError> {
        Ok(self.keypair()?.sign(message))
    }

    /// The `[1, "<publicKey>"]` payload shown as this identity's QR code.
    pub fn public_identity_payload(&self) -> String {
        format_public_identity(&self.public_key)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", self.id())
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl TryFrom<IdentityRecord> for Identity {
    type Error = DidError;

    fn try_from(record: IdentityRecord) -> Result<Self, Self::Error> {
        let private_key = Zeroizing::new(record.private_key);
        let keypair = KeyPair::from_secret_base64(&private_key)?;
        if keypair.public_key() != record.public_key {
            return Err(DidError::KeyMismatch(record.public_key.to_base64()));
        }
        if record.doc.public_key()? != record.public_key {
            return Err(DidError::KeyMismatch(record.public_key.to_base64()));
        }
        record.doc.verify_content_address()?;
        Ok(Self {
            private_key,
            public_key: record.public_key,
            document: record.doc,
        })
    }
}

impl From<Identity> for IdentityRecord {
    fn from(identity: Identity) -> Self {
        Self {
            private_key: identity.private_key.as_str().to_string(),
            public_key: identity.public_key,
            doc: identity.document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identity_is_consistent() {
        let identity = Identity::generate().unwrap();
        assert_eq!(identity.document().public_key().unwrap(), *identity.public_key());
        identity.document().verify_content_address().unwrap();
        assert_eq!(identity.keypair().unwrap().public_key(), *identity.public_key());
    }

    #[test]
    fn same_keypair_same_id() {
        let kp = KeyPair::from_seed(&[4u8; 32]);
        let a = Identity::from_keypair(&kp).unwrap();
        let b = Identity::from_keypair(&kp).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn persisted_shape_uses_private_public_doc() {
        let identity = Identity::from_keypair(&KeyPair::from_seed(&[5u8; 32])).unwrap();
        let value = serde_json::to_value(&identity).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["doc", "privateKey", "publicKey"]);
        assert_eq!(value["publicKey"], identity.public_key().to_base64());
    }

    #[test]
    fn serde_roundtrip_preserves_signing_ability() {
        let identity = Identity::from_keypair(&KeyPair::from_seed(&[6u8; 32])).unwrap();
        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), identity.id());
        let sig = back.sign(b"hello").unwrap();
        assert!(identity.public_key().verify(b"hello", &sig));
    }

    #[test]
    fn mismatched_record_is_rejected() {
        let a = Identity::from_keypair(&KeyPair::from_seed(&[7u8; 32])).unwrap();
        let b = Identity::from_keypair(&KeyPair::from_seed(&[8u8; 32])).unwrap();
        let mut value = serde_json::to_value(&a).unwrap();
        value["publicKey"] = serde_json::to_value(b.public_key()).unwrap();
        assert!(serde_json::from_value::<Identity>(value).is_err());

        let mut value = serde_json::to_value(&a).unwrap();
        value["doc"] = serde_json::to_value(b.document()).unwrap();
        assert!(serde_json::from_value::<Identity>(value).is_err());
    }

    #[test]
    fn debug_redacts_private_key() {
        let identity = Identity::from_keypair(&KeyPair::from_seed(&[9u8; 32])).unwrap();
        let rendered = format!("{identity:?}");
        let secret = KeyPair::from_seed(&[9u8; 32]).secret_base64();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(secret.as_str()));
    }
}

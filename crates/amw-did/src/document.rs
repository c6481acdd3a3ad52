//! # DID Document Builder
//!
//! Builds the identity document for a public key in two steps:
//!
//! 1. Serialize the *template* canonically. The template carries the key
//!    but no `id`, no method `id`, and no `controller`.
//! 2. Hash it with SHA3-512, set `id = did:amatelus:<hex>`, then fill in the
//!    verification method's `id` (`<did>#key-1`) and `controller`.
//!
//! Hashing before the self-reference exists is what breaks the circularity
//! between the identifier and the document that contains it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use amw_core::{sha3_512_hex, CanonicalBytes, Did};
use amw_crypto::PublicKey;

use crate::error::DidError;

pub const DID_METHOD: &str = "amatelus";
pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
pub const KEY_FRAGMENT: &str = "key-1";
pub const VERIFICATION_KEY_TYPE: &str = "Ed25519VerificationKey2020";

/// Relative reference used by `authentication` and `assertionMethod`.
const KEY_REFERENCE: &str = "#key-1";

/// Multibase prefix for the key encoding.
const MULTIBASE_PREFIX: char = 'z';

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateMethod {
    #[serde(rename = "type")]
    key_type: &'static str,
    public_key_multibase: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DidDocumentTemplate {
    #[serde(rename = "@context")]
    context: [&'static str; 1],
    verification_method: [TemplateMethod; 1],
    authentication: [&'static str; 1],
    assertion_method: [&'static str; 1],
}

impl DidDocumentTemplate {
    fn for_key(public_key: &PublicKey) -> Self {
        Self {
            context: [DID_V1_CONTEXT],
            verification_method: [TemplateMethod {
                key_type: VERIFICATION_KEY_TYPE,
                public_key_multibase: encode_multibase(public_key),
            }],
            authentication: [KEY_REFERENCE],
            assertion_method: [KEY_REFERENCE],
        }
    }
}

/// The single key entry of a [`DidDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationMethod {
    /// `<did>#key-1`.
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub controller: Did,
    /// `z` followed by the base64 public key.
    pub public_key_multibase: String,
}

/// A minimal DID document with exactly one verification method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: Did,
    pub verification_method: [VerificationMethod; 1],
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
}

/// Build the document for raw public key bytes.
///
/// # Errors
///
/// [`DidError::InvalidKeyMaterial`] if `public_key` is not 32 bytes.
pub fn build(public_key: &[u8]) -> Result<DidDocument, DidError> {
    let key =
        PublicKey::from_slice(public_key).map_err(|e| DidError::InvalidKeyMaterial(e.to_string()))?;
    build_for_key(&key)
}

/// Build the document for an already-validated public key.
pub fn build_for_key(public_key: &PublicKey) -> Result<DidDocument, DidError> {
    let template = DidDocumentTemplate::for_key(public_key);
    let canonical = CanonicalBytes::new(&template)?;
    let did = Did::new(format!("did:{DID_METHOD}:{}", sha3_512_hex(&canonical)))?;

    let [template_method] = template.verification_method;
    Ok(DidDocument {
        context: vec![DID_V1_CONTEXT.to_string()],
        verification_method: [VerificationMethod {
            id: did.with_fragment(KEY_FRAGMENT),
            key_type: template_method.key_type.to_string(),
            controller: did.clone(),
            public_key_multibase: template_method.public_key_multibase,
        }],
        authentication: vec![KEY_REFERENCE.to_string()],
        assertion_method: vec![KEY_REFERENCE.to_string()],
        id: did,
    })
}

impl DidDocument {
    pub fn verification_method(&self) -> &VerificationMethod {
        &self.verification_method[0]
    }

    /// Decode the public key carried by the verification method.
    pub fn public_key(&self) -> Result<PublicKey, DidError> {
        decode_multibase(&self.verification_method().public_key_multibase)
    }

    /// Rebuild from the embedded key and require the result to equal `self`.
    ///
    /// # Errors
    ///
    /// [`DidError::ContentAddressMismatch`] if the identifier or any other
    /// field differs from what the key produces.
    pub fn verify_content_address(&self) -> Result<(), DidError> {
        let rebuilt = build_for_key(&self.public_key()?)?;
        if rebuilt != *self {
            return Err(DidError::ContentAddressMismatch {
                expected: rebuilt.id.to_string(),
                found: self.id.to_string(),
            });
        }
        Ok(())
    }
}

fn encode_multibase(public_key: &PublicKey) -> String {
    format!("{MULTIBASE_PREFIX}{}", public_key.to_base64())
}

fn decode_multibase(encoded: &str) -> Result<PublicKey, DidError> {
    let body = encoded.strip_prefix(MULTIBASE_PREFIX).ok_or_else(|| {
        DidError::InvalidKeyMaterial(format!("publicKeyMultibase must start with '{MULTIBASE_PREFIX}'"))
    })?;
    let bytes = BASE64
        .decode(body)
        .map_err(|e| DidError::InvalidKeyMaterial(e.to_string()))?;
    PublicKey::from_slice(&bytes).map_err(|e| DidError::InvalidKeyMaterial(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amw_crypto::KeyPair;

    fn key(seed: u8) -> PublicKey {
        KeyPair::from_seed(&[seed; 32]).public_key()
    }

    #[test]
    fn build_is_deterministic() {
        let pk = key(1);
        let a = build(pk.as_bytes()).unwrap();
        let b = build(pk.as_bytes()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn id_is_sha3_512_of_template() {
        let doc = build(key(2).as_bytes()).unwrap();
        let hash = doc.id.method_specific_id();
        assert_eq!(doc.id.method(), DID_METHOD);
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn template_excludes_self_reference() {
        let pk = key(3);
        let template = serde_json::to_value(DidDocumentTemplate::for_key(&pk)).unwrap();
        assert!(template.get("id").is_none());
        let method = &template["verificationMethod"][0];
        assert!(method.get("id").is_none());
        assert!(method.get("controller").is_none());
        assert_eq!(method["type"], VERIFICATION_KEY_TYPE);
    }

    #[test]
    fn method_references_document_id() {
        let doc = build(key(4).as_bytes()).unwrap();
        let vm = doc.verification_method();
        assert_eq!(vm.id, format!("{}#key-1", doc.id));
        assert_eq!(vm.controller, doc.id);
        assert_eq!(doc.authentication, vec!["#key-1"]);
        assert_eq!(doc.assertion_method, vec!["#key-1"]);
        assert_eq!(doc.context, vec![DID_V1_CONTEXT]);
    }

    #[test]
    fn multibase_carries_base64_key() {
        let pk = key(5);
        let doc = build(pk.as_bytes()).unwrap();
        assert_eq!(
            doc.verification_method().public_key_multibase,
            format!("z{}", pk.to_base64())
        );
        assert_eq!(doc.public_key().unwrap(), pk);
    }

    #[test]
    fn distinct_keys_give_distinct_ids() {
        let a = build(key(6).as_bytes()).unwrap();
        let b = build(key(7).as_bytes()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn wrong_length_key_is_invalid_key_material() {
        for len in [0usize, 31, 33, 64] {
            let err = build(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, DidError::InvalidKeyMaterial(_)), "len {len}");
        }
    }

    #[test]
    fn content_address_verifies_and_detects_tampering() {
        let doc = build(key(8).as_bytes()).unwrap();
        doc.verify_content_address().unwrap();

        let mut swapped = doc.clone();
        swapped.verification_method[0].public_key_multibase = format!("z{}", key(9).to_base64());
        assert!(matches!(
            swapped.verify_content_address(),
            Err(DidError::ContentAddressMismatch { .. })
        ));
    }

    #[test]
    fn document_serde_roundtrip_rejects_extra_fields() {
        let doc = build(key(10).as_bytes()).unwrap();
        let mut value = serde_json::to_value(&doc).unwrap();
        let back: DidDocument = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, doc);

        value["service"] = serde_json::json!([]);
        assert!(serde_json::from_value::<DidDocument>(value).is_err());
    }

    #[test]
    fn document_requires_exactly_one_method() {
        let doc = build(key(11).as_bytes()).unwrap();
        let mut value = serde_json::to_value(&doc).unwrap();
        let vm = value["verificationMethod"][0].clone();
        value["verificationMethod"] = serde_json::json!([vm.clone(), vm]);
        assert!(serde_json::from_value::<DidDocument>(value).is_err());
    }
}

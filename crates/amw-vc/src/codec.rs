//! # Credential Codec
//!
//! `encode` produces the canonical text that the transport splits and
//! hashes. `decode` is all-or-nothing: either a credential that satisfies
//! the schema and can be re-encoded, or a [`DecodeError`].

use amw_core::CanonicalBytes;

use crate::credential::VerifiableCredential;
use crate::error::{DecodeError, VcError};

/// Canonical bytes of a credential.
pub fn canonical_bytes(vc: &VerifiableCredential) -> Result<CanonicalBytes, VcError> {
    Ok(CanonicalBytes::new(vc)?)
}

/// Canonical JSON text of a credential. Equal credentials always encode to
/// identical text.
pub fn encode(vc: &VerifiableCredential) -> Result<String, VcError> {
    Ok(canonical_bytes(vc)?.into_string())
}

/// Parse and validate a credential.
///
/// A credential whose subject carries non-integer numbers is rejected here,
/// since it could never be re-encoded for transport.
pub fn decode(text: &str) -> Result<VerifiableCredential, DecodeError> {
    let vc: VerifiableCredential = serde_json::from_str(text)?;
    CanonicalBytes::new(&vc).map_err(|e| DecodeError::Schema(e.to_string()))?;
    Ok(vc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amw_core::{Did, Timestamp};
    use serde_json::json;

    fn sample() -> VerifiableCredential {
        let holder = Did::new("did:amatelus:codec-holder").unwrap();
        let ts = Timestamp::parse("2024-06-01T00:00:00Z").unwrap();
        VerifiableCredential::sample_resident(&holder, ts).unwrap()
    }

    #[test]
    fn encode_is_stable_and_sorted() {
        let vc = sample();
        let a = encode(&vc).unwrap();
        let b = encode(&vc.clone()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("{\"@context\":"));
    }

    #[test]
    fn decode_inverts_encode() {
        let vc = sample();
        let text = encode(&vc).unwrap();
        assert_eq!(decode(&text).unwrap(), vc);
    }

    #[test]
    fn decode_accepts_non_canonical_input() {
        let vc = sample();
        let pretty = serde_json::to_string_pretty(&vc).unwrap();
        assert_eq!(decode(&pretty).unwrap(), vc);
    }

    #[test]
    fn decode_tags_syntax_and_schema_errors() {
        assert!(matches!(decode("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode("[]"), Err(DecodeError::Schema(_))));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["type"] = json!(["ResidentCredential"]);
        assert!(matches!(
            decode(&value.to_string()),
            Err(DecodeError::Schema(_))
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("proof");
        assert!(matches!(
            decode(&value.to_string()),
            Err(DecodeError::Schema(_))
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["proof"]["cryptosuite"] = json!("ecdsa-2019");
        assert!(matches!(
            decode(&value.to_string()),
            Err(DecodeError::Schema(_))
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["credentialSubject"]["id"] = json!("holder");
        assert!(matches!(
            decode(&value.to_string()),
            Err(DecodeError::Schema(_))
        ));
    }

    #[test]
    fn decode_rejects_float_attributes() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["credentialSubject"]["height"] = json!(172.5);
        assert!(matches!(
            decode(&value.to_string()),
            Err(DecodeError::Schema(_))
        ));
    }
}

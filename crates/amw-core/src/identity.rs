//! # Identifier Newtypes
//!
//! A [`Did`] names a holder, issuer, prover, or verifier. A [`CredentialId`]
//! names one credential. Both validate at construction and at
//! deserialization, so an unvalidated identifier never reaches the rest of
//! the wallet.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Route `Deserialize` for a string newtype through its validating `new()`.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// W3C Decentralized Identifier: `did:<method>:<method-specific-id>`.
///
/// The method is lowercase ASCII alphanumeric; the method-specific id is
/// non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// `did:method:identifier`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        match split_did(&s) {
            Some(_) => Ok(Self(s)),
            None => Err(ValidationError::InvalidDid(s)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method name, e.g. `amatelus`.
    pub fn method(&self) -> &str {
        split_did(&self.0).map(|(m, _)| m).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        split_did(&self.0).map(|(_, id)| id).unwrap_or_default()
    }

    /// A DID URL pointing at a fragment of this DID's document.
    pub fn with_fragment(&self, fragment: &str) -> String {
        format!("{}#{fragment}", self.0)
    }
}

fn split_did(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix("did:")?;
    let (method, id) = rest.split_once(':')?;
    let method_ok = !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let id_ok = !id.is_empty() && !id.chars().any(char::is_whitespace);
    (method_ok && id_ok).then_some((method, id))
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Shorten a DID for display: `...` followed by its last 8 characters.
pub fn short_did(did: &Did) -> String {
    let chars: Vec<char> = did.as_str().chars().collect();
    let tail: String = chars[chars.len().saturating_sub(8)..].iter().collect();
    format!("...{tail}")
}

/// Identifier of a single credential, typically `urn:uuid:<v4>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CredentialId(String);

impl_validating_deserialize!(CredentialId);

impl CredentialId {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCredentialId`] for empty strings or
    /// strings containing whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidCredentialId(s));
        }
        Ok(Self(s))
    }

    /// A fresh `urn:uuid:` identifier.
    pub fn new_urn() -> Self {
        Self(format!("urn:uuid:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CredentialId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_accepts_method_and_id() {
        let did = Did::new("did:amatelus:local-government-sample").unwrap();
        assert_eq!(did.method(), "amatelus");
        assert_eq!(did.method_specific_id(), "local-government-sample");
        assert_eq!(did.with_fragment("key-1"), "did:amatelus:local-government-sample#key-1");
    }

    #[test]
    fn did_id_may_contain_colons() {
        let did = Did::new("did:web:example.com:user:alice").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.method_specific_id(), "example.com:user:alice");
    }

    #[test]
    fn did_rejects_malformed() {
        for bad in [
            "",
            "did:",
            "did:amatelus",
            "did:amatelus:",
            "did::abc",
            "did:Upper:abc",
            "dad:amatelus:abc",
            "did:amatelus:has space",
        ] {
            assert!(Did::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn did_deserialization_validates() {
        assert!(serde_json::from_str::<Did>(r#""did:amatelus:abc""#).is_ok());
        assert!(serde_json::from_str::<Did>(r#""not-a-did""#).is_err());
    }

    #[test]
    fn short_did_keeps_last_eight() {
        let did = Did::new("did:amatelus:0123456789abcdef").unwrap();
        assert_eq!(short_did(&did), "...89abcdef");
    }

    #[test]
    fn credential_id_urn_is_valid() {
        let id = CredentialId::new_urn();
        assert!(id.as_str().starts_with("urn:uuid:"));
        assert!(CredentialId::new(id.as_str()).is_ok());
        assert_ne!(CredentialId::new_urn(), id);
    }

    #[test]
    fn credential_id_rejects_empty_and_whitespace() {
        assert!(CredentialId::new("").is_err());
        assert!(CredentialId::new("urn:uuid: x").is_err());
    }
}

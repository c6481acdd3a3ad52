//! Errors for credentials, decoding, and chunked transport.

use amw_core::{CanonicalizationError, ErrorClass, ValidationError};
use thiserror::Error;

/// Errors from building or inspecting a credential.
#[derive(Error, Debug)]
pub enum VcError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A subject attribute required by the caller is absent.
    #[error("credential subject has no {0:?} attribute")]
    MissingAttribute(String),

    /// A subject attribute is present but malformed.
    #[error("credential subject attribute {name:?} is invalid: {reason}")]
    InvalidAttribute { name: String, reason: String },
}

/// Why a text failed to decode as a credential. Carries no partial value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not JSON.
    #[error("malformed JSON: {0}")]
    Json(String),

    /// The JSON does not match the credential schema.
    #[error("schema violation: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => Self::Json(err.to_string()),
            Category::Data => Self::Schema(err.to_string()),
        }
    }
}

/// Failures of the chunked transport, on either side.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid metadata")]
    InvalidMetadata,

    #[error("metadata not yet received")]
    MetadataNotReceived,

    #[error("invalid part format")]
    InvalidPartFormat,

    #[error("index out of range: valid 0..{}", .total_parts.saturating_sub(1))]
    IndexOutOfRange { index: u64, total_parts: usize },

    /// Every index with no stored chunk, ascending.
    #[error("missing parts: {}", join_indices(.0))]
    MissingParts(Vec<usize>),

    #[error("integrity check failed: hash mismatch")]
    HashMismatch,

    #[error("reconstructed credential invalid")]
    InvalidCredential(#[source] DecodeError),

    /// The transfer already produced a credential; start a new one first.
    #[error("transfer already reconstructed")]
    AlreadyReconstructed,

    #[error("max part size must be at least 1 byte")]
    ZeroPartSize,

    #[error(transparent)]
    Encode(#[from] VcError),
}

impl TransportError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingParts(_) | Self::HashMismatch | Self::InvalidCredential(_) => {
                ErrorClass::Integrity
            }
            Self::InvalidMetadata
            | Self::MetadataNotReceived
            | Self::InvalidPartFormat
            | Self::IndexOutOfRange { .. }
            | Self::AlreadyReconstructed
            | Self::ZeroPartSize
            | Self::Encode(_) => ErrorClass::MalformedInput,
        }
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(TransportError::InvalidMetadata.to_string(), "invalid metadata");
        assert_eq!(
            TransportError::MetadataNotReceived.to_string(),
            "metadata not yet received"
        );
        assert_eq!(TransportError::InvalidPartFormat.to_string(), "invalid part format");
        assert_eq!(
            TransportError::IndexOutOfRange { index: 4, total_parts: 4 }.to_string(),
            "index out of range: valid 0..3"
        );
        assert_eq!(
            TransportError::MissingParts(vec![1, 3]).to_string(),
            "missing parts: 1, 3"
        );
        assert_eq!(
            TransportError::HashMismatch.to_string(),
            "integrity check failed: hash mismatch"
        );
        assert_eq!(
            TransportError::InvalidCredential(DecodeError::Schema("x".into())).to_string(),
            "reconstructed credential invalid"
        );
    }

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(TransportError::HashMismatch.class(), ErrorClass::Integrity);
        assert_eq!(TransportError::MissingParts(vec![0]).class(), ErrorClass::Integrity);
        assert_eq!(TransportError::InvalidPartFormat.class(), ErrorClass::MalformedInput);
    }

    #[test]
    fn decode_error_distinguishes_syntax_from_schema() {
        let syntax = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(DecodeError::from(syntax), DecodeError::Json(_)));
        let data = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        assert!(matches!(DecodeError::from(data), DecodeError::Schema(_)));
    }
}

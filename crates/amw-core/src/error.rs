//! # Error Types
//!
//! Errors raised by the foundational types. Higher crates wrap these in
//! their own enums with `#[from]` so the underlying cause is preserved.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Non-integer numbers have no stable canonical form.
    #[error("float values are not permitted in canonical representations; encode as string: {0}")]
    FloatRejected(f64),

    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A value failed format validation at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid DID {0:?}: expected did:<method>:<identifier>")]
    InvalidDid(String),

    #[error("invalid credential id {0:?}: must be non-empty and contain no whitespace")]
    InvalidCredentialId(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// Coarse failure classification shared by the transport receiver and the
/// proof engine. Callers branch on this to decide between re-prompting,
/// restarting a transfer, and giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad JSON, wrong shape, out-of-range index. Nothing was committed.
    MalformedInput,
    /// Hash mismatch or missing parts. Restart or re-scan the transfer.
    Integrity,
    /// A predicate the input cannot satisfy. Terminal, never retried.
    BusinessRule,
    /// Entropy or other resource exhaustion. Fatal.
    Resource,
}

impl ErrorClass {
    /// Only malformed input and integrity failures can succeed on retry.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::MalformedInput | Self::Integrity)
    }
}

//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only way the wallet turns a structured value into
//! bytes that will be hashed or split for transport.
//!
//! ## Invariants
//!
//! - Object keys are sorted, separators are compact, and there is no trailing
//!   whitespace (RFC 8785 / JCS via `serde_jcs`).
//! - Non-integer numbers are rejected. JCS number formatting for floats has
//!   edge cases that different producers disagree on; credential attributes
//!   that need fractional values must carry them as strings.
//! - The output is valid UTF-8, so it can be carried in QR text payloads
//!   without a second encoding layer.
//!
//! Two calls with logically equal input always produce identical bytes. The
//! chunked transport hashes exactly these bytes, and the DID builder derives
//! the identifier from them.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// The inner buffer is private; [`CanonicalBytes::new()`] and
/// [`CanonicalBytes::from_value()`] are the only constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a non-integer number, or [`CanonicalizationError::SerializationFailed`]
    /// if serialization itself fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Canonicalize an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as text.
    ///
    /// JCS output is always UTF-8, so the fallback branch is unreachable in
    /// practice; it returns an empty string rather than panicking.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Consume into an owned `String`.
    pub fn into_string(self) -> String {
        String::from_utf8(self.0).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}

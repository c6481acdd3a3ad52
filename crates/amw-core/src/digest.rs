//! # Content Digests
//!
//! SHA3 digests used across the wallet:
//!
//! - **SHA3-512** content-addresses identity documents (`did:amatelus:<hex>`).
//! - **SHA3-256** protects chunked credential transfers (manifest `hash`) and
//!   produces the proof commitments and nullifiers.
//!
//! Structured values are hashed through [`CanonicalBytes`]. Raw
//! concatenations (`a ‖ b ‖ c`) go through [`Sha3Accumulator::labeled`],
//! which length-prefixes each field so that `("ab", "c")` and `("a", "bc")`
//! can never collide.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256, Sha3_512};

use crate::canonical::CanonicalBytes;

/// Hash algorithm tag carried by every [`ContentDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha3-512")]
    Sha3_512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_512 => "sha3-512",
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha3_256 => 32,
            Self::Sha3_512 => 64,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A digest value together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    pub algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl ContentDigest {
    fn new(algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering, the form used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// SHA3-256 over canonical bytes.
pub fn sha3_256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest::new(
        DigestAlgorithm::Sha3_256,
        Sha3_256::digest(data.as_bytes()).to_vec(),
    )
}

/// SHA3-256 hex over canonical bytes.
pub fn sha3_256_hex(data: &CanonicalBytes) -> String {
    sha3_256_digest(data).to_hex()
}

/// SHA3-512 hex over canonical bytes. Used for content-addressed identifiers.
pub fn sha3_512_hex(data: &CanonicalBytes) -> String {
    ContentDigest::new(
        DigestAlgorithm::Sha3_512,
        Sha3_512::digest(data.as_bytes()).to_vec(),
    )
    .to_hex()
}

/// SHA3-256 hex over an arbitrary UTF-8 string.
///
/// The receiving side of a chunked transfer only ever holds the concatenated
/// text, never a structured value, so the manifest hash is defined over the
/// string itself. On the sending side the string is the canonical encoding,
/// which makes this equal to [`sha3_256_hex`] of the same bytes.
pub fn sha3_256_str_hex(text: &str) -> String {
    hex::encode(Sha3_256::digest(text.as_bytes()))
}

/// Incremental SHA3-256 over length-prefixed fields.
///
/// Each field is written as an 8-byte big-endian length followed by its
/// bytes. This is the `‖` operator of the proof protocol.
#[derive(Clone, Default)]
pub struct Sha3Accumulator {
    hasher: Sha3_256,
}

impl Sha3Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one length-prefixed field.
    pub fn field(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();
        self.hasher.update((data.len() as u64).to_be_bytes());
        self.hasher.update(data);
        self
    }

    pub fn finalize(self) -> ContentDigest {
        ContentDigest::new(DigestAlgorithm::Sha3_256, self.hasher.finalize().to_vec())
    }

    pub fn finalize_hex(self) -> String {
        self.finalize().to_hex()
    }

    /// One-shot digest of a sequence of fields.
    pub fn labeled<I, T>(fields: I) -> ContentDigest
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut acc = Self::new();
        for f in fields {
            acc.field(f);
        }
        acc.finalize()
    }
}

impl std::fmt::Debug for Sha3Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Sha3Accumulator")
    }
}

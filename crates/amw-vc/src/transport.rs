//! # Chunked Transport Encoder
//!
//! Splits a credential's canonical text into QR-sized parts.
//!
//! ## Wire shapes
//!
//! - Manifest: `{"totalParts": <int>, "hash": "<sha3-256 hex>"}`
//! - Part: `[<index>, "<chunk>"]`, a two-element array. The index is
//!   emitted as a JSON integer; a numeric string is also accepted on input.
//!
//! ## Invariant
//!
//! Concatenating the chunks in index order reproduces the canonical text
//! exactly, and its SHA3-256 is `manifest.hash`.
//!
//! Chunks are cut greedily at UTF-8 character boundaries, never inside a
//! character. For ASCII text this gives exactly `ceil(len / max_part_bytes)`
//! parts. Multibyte text can need a few more, and a single character wider
//! than `max_part_bytes` becomes a part of its own.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::json;

use amw_core::sha3_256_str_hex;

use crate::codec::encode;
use crate::credential::VerifiableCredential;
use crate::error::TransportError;

/// Announces a transfer: how many parts, and the digest of the whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub total_parts: usize,
    pub hash: String,
}

impl Manifest {
    /// Largest `totalParts` a receiver accepts unless configured otherwise.
    /// At 500 bytes per part this admits credentials of about 2 MB.
    pub const DEFAULT_MAX_PARTS: usize = 4096;

    /// Parse a scanned manifest payload, capped at
    /// [`DEFAULT_MAX_PARTS`](Self::DEFAULT_MAX_PARTS).
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidMetadata`] unless the text is an object with
    /// a positive integer `totalParts` and a string `hash`.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        Self::parse_with_limit(raw, Self::DEFAULT_MAX_PARTS)
    }

    /// [`parse`](Self::parse) with an explicit cap on `totalParts`.
    ///
    /// The receiver allocates per announced part, so a manifest above
    /// `max_parts` is rejected as [`TransportError::InvalidMetadata`].
    pub fn parse_with_limit(raw: &str, max_parts: usize) -> Result<Self, TransportError> {
        let manifest: Self =
            serde_json::from_str(raw.trim()).map_err(|_| TransportError::InvalidMetadata)?;
        if manifest.total_parts == 0 || manifest.total_parts > max_parts {
            return Err(TransportError::InvalidMetadata);
        }
        Ok(manifest)
    }

    pub fn to_payload(&self) -> String {
        json!({ "totalParts": self.total_parts, "hash": self.hash }).to_string()
    }

    /// `true` iff `text` is the payload this manifest announces.
    pub fn matches(&self, text: &str) -> bool {
        sha3_256_str_hex(text).eq_ignore_ascii_case(&self.hash)
    }
}

/// One indexed chunk of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub index: usize,
    pub chunk: String,
}

impl Part {
    /// Parse a scanned part payload.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidPartFormat`] unless the text is an
    /// `[index, chunk]` pair with a non-negative integer index.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        serde_json::from_str(raw.trim()).map_err(|_| TransportError::InvalidPartFormat)
    }

    pub fn to_payload(&self) -> String {
        json!([self.index, self.chunk]).to_string()
    }
}

impl Serialize for Part {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.index)?;
        tuple.serialize_element(&self.chunk)?;
        tuple.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireIndex {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (index, chunk) = <(WireIndex, String)>::deserialize(deserializer)?;
        let index = match index {
            WireIndex::Number(n) => n,
            WireIndex::Text(s) => s
                .parse::<u64>()
                .map_err(|_| de::Error::custom(format!("part index {s:?} is not a number")))?,
        };
        let index = usize::try_from(index).map_err(de::Error::custom)?;
        Ok(Self { index, chunk })
    }
}

/// A manifest and the parts it announces, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub manifest: Manifest,
    pub parts: Vec<Part>,
}

impl TransferPlan {
    /// Every payload to display, manifest first.
    pub fn payloads(&self) -> Vec<String> {
        std::iter::once(self.manifest.to_payload())
            .chain(self.parts.iter().map(Part::to_payload))
            .collect()
    }
}

/// Split a credential for transport.
///
/// Chunks end on UTF-8 character boundaries, so `max_part_bytes` is an
/// upper bound per part and the part count can exceed
/// `ceil(len / max_part_bytes)` for multibyte text. Size QR codes from
/// `plan.parts.len()`, not from that quotient.
///
/// # Errors
///
/// [`TransportError::ZeroPartSize`] if `max_part_bytes` is 0, or
/// [`TransportError::Encode`] if the credential cannot be canonicalized.
pub fn split(vc: &VerifiableCredential, max_part_bytes: usize) -> Result<TransferPlan, TransportError> {
    if max_part_bytes == 0 {
        return Err(TransportError::ZeroPartSize);
    }
    let text = encode(vc)?;
    let manifest_hash = sha3_256_str_hex(&text);
    let parts: Vec<Part> = chunk_text(&text, max_part_bytes)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| Part { index, chunk })
        .collect();

    tracing::debug!(
        credential = %vc.id,
        bytes = text.len(),
        total_parts = parts.len(),
        "split credential for transport"
    );

    Ok(TransferPlan {
        manifest: Manifest {
            total_parts: parts.len(),
            hash: manifest_hash,
        },
        parts,
    })
}

fn chunk_text(text: &str, max_part_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + max_part_bytes).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        chunks.push(text[start..end].to_string());
        start = end;
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use amw_core::{Did, Timestamp};

    fn sample() -> VerifiableCredential {
        let holder = Did::new("did:amatelus:transport-holder").unwrap();
        let ts = Timestamp::parse("2024-06-01T00:00:00Z").unwrap();
        VerifiableCredential::sample_resident(&holder, ts).unwrap()
    }

    fn ascii_sample() -> VerifiableCredential {
        sample()
            .with_attribute("name", "Sample Taro")
            .with_attribute("address", "1-1-1 Shibuya, Tokyo")
    }

    #[test]
    fn ascii_text_splits_into_ceil_parts() {
        let vc = ascii_sample();
        let len = encode(&vc).unwrap().len();
        for max in [1usize, 7, 100, len - 1, len, len + 1] {
            let plan = split(&vc, max).unwrap();
            assert_eq!(plan.manifest.total_parts, len.div_ceil(max), "max {max}");
            assert_eq!(plan.parts.len(), plan.manifest.total_parts);
        }
    }

    #[test]
    fn single_part_is_legal() {
        let plan = split(&sample(), 1_000_000).unwrap();
        assert_eq!(plan.manifest.total_parts, 1);
        assert_eq!(plan.parts[0].index, 0);
        assert_eq!(plan.payloads().len(), 2);
    }

    #[test]
    fn concatenation_reproduces_canonical_text() {
        let vc = sample();
        let text = encode(&vc).unwrap();
        for max in [1usize, 2, 3, 5, 64] {
            let plan = split(&vc, max).unwrap();
            let joined: String = plan.parts.iter().map(|p| p.chunk.as_str()).collect();
            assert_eq!(joined, text);
            assert!(plan.manifest.matches(&joined));
            assert_eq!(plan.manifest.hash, sha3_256_str_hex(&text));
        }
    }

    #[test]
    fn multibyte_characters_are_never_cut() {
        let plan = split(&sample(), 2).unwrap();
        for part in &plan.parts {
            assert!(!part.chunk.is_empty());
            assert!(part.chunk.len() <= 3, "{:?}", part.chunk);
        }
    }

    #[test]
    fn zero_part_size_is_rejected() {
        assert!(matches!(split(&sample(), 0), Err(TransportError::ZeroPartSize)));
    }

    #[test]
    fn part_wire_shape_is_a_pair() {
        let part = Part { index: 3, chunk: "ab\"c".to_string() };
        let payload = part.to_payload();
        assert_eq!(payload, r#"[3,"ab\"c"]"#);
        assert_eq!(Part::parse(&payload).unwrap(), part);
        assert_eq!(serde_json::to_string(&part).unwrap(), payload);
    }

    #[test]
    fn part_accepts_numeric_string_index() {
        assert_eq!(Part::parse(r#"["2","xy"]"#).unwrap().index, 2);
    }

    #[test]
    fn part_rejects_bad_shapes() {
        for bad in [
            "",
            "{}",
            r#"{"index":0,"chunk":"x"}"#,
            r#"[0]"#,
            r#"[-1,"x"]"#,
            r#"[1.5,"x"]"#,
            r#"["two","x"]"#,
            r#"[0,1]"#,
            r#"[0,"x","y"]"#,
        ] {
            assert!(
                matches!(Part::parse(bad), Err(TransportError::InvalidPartFormat)),
                "{bad}"
            );
        }
    }

    #[test]
    fn manifest_parse_and_payload() {
        let manifest = Manifest { total_parts: 4, hash: "ab".repeat(32) };
        assert_eq!(Manifest::parse(&manifest.to_payload()).unwrap(), manifest);
        for bad in [
            "",
            "[]",
            r#"{"totalParts":0,"hash":"x"}"#,
            r#"{"totalParts":-1,"hash":"x"}"#,
            r#"{"totalParts":2.5,"hash":"x"}"#,
            r#"{"totalParts":2}"#,
            r#"{"hash":"x"}"#,
        ] {
            assert!(
                matches!(Manifest::parse(bad), Err(TransportError::InvalidMetadata)),
                "{bad}"
            );
        }
    }

    #[test]
    fn manifest_part_count_is_capped() {
        let at_cap = format!(r#"{{"totalParts":{},"hash":"00"}}"#, Manifest::DEFAULT_MAX_PARTS);
        assert!(Manifest::parse(&at_cap).is_ok());
        for over in [
            format!(r#"{{"totalParts":{},"hash":"00"}}"#, Manifest::DEFAULT_MAX_PARTS + 1),
            r#"{"totalParts":18446744073709551615,"hash":"00"}"#.to_string(),
        ] {
            assert!(matches!(Manifest::parse(&over), Err(TransportError::InvalidMetadata)));
        }
        assert!(Manifest::parse_with_limit(r#"{"totalParts":9,"hash":"00"}"#, 8).is_err());
        assert!(Manifest::parse_with_limit(r#"{"totalParts":8,"hash":"00"}"#, 8).is_ok());
    }
}

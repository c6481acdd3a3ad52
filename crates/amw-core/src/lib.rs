//! # amw-core — Foundational Types for the Amatelus Wallet
//!
//! Every other crate in the workspace depends on `amw-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `Did` and `CredentialId` validate
//!    at construction and at deserialization. No bare strings for identifiers.
//!
//! 2. **`CanonicalBytes` newtype.** Every digest over a structured value flows
//!    through `CanonicalBytes::new()`. The same logical value always yields the
//!    same bytes, which is what the transport manifest hash and the
//!    content-addressed DID rely on.
//!
//! 3. **Digests carry their algorithm.** `ContentDigest` tags SHA3-256 and
//!    SHA3-512 output so that a 64-byte identifier hash is never confused
//!    with a 32-byte integrity hash.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is UTC with `Z` suffix and seconds
//!    precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `amw-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{
    sha3_256_digest, sha3_256_hex, sha3_256_str_hex, sha3_512_hex, ContentDigest, DigestAlgorithm,
    Sha3Accumulator,
};
pub use error::{CanonicalizationError, ErrorClass, ValidationError};
pub use identity::{short_did, CredentialId, Did};
pub use temporal::Timestamp;

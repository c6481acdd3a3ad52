//! # amw-vc — Verifiable Credentials and Chunked Transport
//!
//! - **Credential schema** ([`VerifiableCredential`]): rigid envelope with
//!   tuple-shaped `@context` and `type`, an extensible subject, and a fixed
//!   Data Integrity proof object.
//! - **Codec** ([`codec::encode`], [`codec::decode`]): canonical JSON out,
//!   all-or-nothing schema validation in.
//! - **Transport** ([`transport::split`], [`CredentialReceiver`]): a
//!   credential too large for one QR code is announced by a manifest
//!   (`totalParts` + SHA3-256 of the canonical text) and sent as indexed
//!   parts. The receiver accepts parts in any order, any number of times,
//!   and only yields a credential once the whole payload hash matches.
//!
//! ## Security Invariants
//!
//! - The bytes that are split and hashed are always the output of
//!   [`CanonicalBytes`](amw_core::CanonicalBytes).
//! - Integrity is end-to-end over the whole payload, never per part.
//! - A failed decode never yields a partial credential.

pub mod codec;
pub mod credential;
pub mod error;
pub mod receiver;
pub mod transport;

pub use codec::{decode, encode};
pub use credential::{
    CredentialContext, CredentialSubject, CredentialTypes, Cryptosuite, DataIntegrityProof,
    DateTimeString, ProofKind, ProofPurpose, StoredCredential, VerifiableCredential,
    VerificationMethodRef, BIRTH_DATE_ATTRIBUTE, REQUIRED_CONTEXTS, RESIDENT_CREDENTIAL_TYPE,
    SAMPLE_ISSUER, VERIFIABLE_CREDENTIAL_TYPE,
};
pub use error::{DecodeError, TransportError, VcError};
pub use receiver::{CredentialReceiver, PartOutcome, ReceiverState};
pub use transport::{split, Manifest, Part, TransferPlan};

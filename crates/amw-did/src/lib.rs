//! # amw-did — Identity Documents
//!
//! A wallet identity is an Ed25519 key pair plus a minimal DID document that
//! names the public key. The identifier is a content address:
//!
//! ```text
//! did:amatelus:<sha3-512 hex of the canonical document template>
//! ```
//!
//! The template is the document before any self-reference is filled in, so
//! the hash is a pure function of the public key. Building twice from the
//! same key yields the same identifier and the same document.
//!
//! Also provided:
//!
//! - [`Identity`]: the wallet-held record (`privateKey`, `publicKey`, `doc`)
//!   as it is persisted.
//! - The public identity QR payload `[1, "<publicKey>"]`.
//! - [`PossessionResponse`]: a signed nonce proving control of a key.

pub mod document;
pub mod error;
pub mod identity;
pub mod possession;

pub use document::{
    build, build_for_key, DidDocument, VerificationMethod, DID_METHOD, DID_V1_CONTEXT,
    KEY_FRAGMENT, VERIFICATION_KEY_TYPE,
};
pub use error::DidError;
pub use identity::Identity;
pub use possession::{
    format_public_identity, parse_public_identity, PossessionResponse, PUBLIC_IDENTITY_VERSION,
};

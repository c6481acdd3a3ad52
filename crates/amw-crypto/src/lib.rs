//! # amw-crypto — Identity Keys
//!
//! Ed25519 key material held by the wallet:
//!
//! - [`KeyPair`] generation from the OS CSPRNG, with entropy failure
//!   surfaced as an error instead of a panic.
//! - Detached signatures over arbitrary byte messages (nonces scanned from a
//!   verifier's QR code, challenge strings).
//! - [`verify()`] as a pure predicate: malformed key or signature material
//!   yields `false`, never an error.
//!
//! Keys and signatures travel as standard base64. The private key encoding is
//! the 64-byte `seed ‖ public key` form, so keys exported by NaCl-style
//! wallets import unchanged.
//!
//! ## Crate Policy
//!
//! - No internal dependencies.
//! - Private key bytes are never logged; `KeyPair` has a redacting `Debug`
//!   and no `Serialize` impl.

pub mod ed25519;
pub mod error;

pub use ed25519::{sign, verify, KeyPair, PublicKey, Signature, PUBLIC_KEY_LEN, SIGNATURE_LEN};
pub use error::CryptoError;

//! # Ed25519 Keys and Detached Signatures
//!
//! ## Encodings
//!
//! - [`PublicKey`]: 32 bytes, serialized as a base64 string.
//! - [`Signature`]: 64 bytes, serialized as a base64 string.
//! - Private key: 64 bytes `seed ‖ public key`, exported as base64 through
//!   [`KeyPair::secret_base64()`] only. A bare 32-byte seed is also accepted
//!   on import.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
const SEED_LEN: usize = 32;
const KEYPAIR_LEN: usize = 64;

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// An Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// # Errors
    ///
    /// [`CryptoError::InvalidKeyMaterial`] unless `bytes` is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyMaterial(format!(
                "public key must be {PUBLIC_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64.decode(encoded.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// `true` iff `signature` is a valid signature of `message` under this key.
    ///
    /// Bytes that do not decode to a curve point verify nothing.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(vk) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify(message, &sig).is_ok()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b64 = self.to_base64();
        write!(f, "PublicKey({}...)", &b64[..8])
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64.decode(encoded.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b64 = self.to_base64();
        write!(f, "Signature({}...)", &b64[..8])
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// An Ed25519 signing key pair. The secret half zeroizes on drop.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Entropy`] if the OS random source fails. Callers must
    /// not retry in a loop; an exhausted entropy source is fatal.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng
            .try_fill_bytes(seed.as_mut())
            .map_err(|e| CryptoError::Entropy(e.to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Import secret key material: a 32-byte seed, or the 64-byte
    /// `seed ‖ public key` form. For the 64-byte form the embedded public key
    /// must match the seed.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.len() {
            SEED_LEN => {
                let mut seed = Zeroizing::new([0u8; SEED_LEN]);
                seed.copy_from_slice(bytes);
                Ok(Self::from_seed(&seed))
            }
            KEYPAIR_LEN => {
                let mut full = Zeroizing::new([0u8; KEYPAIR_LEN]);
                full.copy_from_slice(bytes);
                let signing_key = SigningKey::from_keypair_bytes(&full).map_err(|e| {
                    CryptoError::InvalidKeyMaterial(format!("inconsistent key pair: {e}"))
                })?;
                Ok(Self { signing_key })
            }
            n => Err(CryptoError::InvalidKeyMaterial(format!(
                "secret key must be {SEED_LEN} or {KEYPAIR_LEN} bytes, got {n}"
            ))),
        }
    }

    pub fn from_secret_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(BASE64.decode(encoded.trim())?);
        Self::from_secret_bytes(&bytes)
    }

    /// The 64-byte `seed ‖ public key` form, base64 encoded.
    pub fn secret_base64(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(BASE64.encode(bytes.as_ref()))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Detached signature over `message`. Ed25519 signing is deterministic.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Free functions over raw bytes
// ---------------------------------------------------------------------------

/// Sign `message` with raw secret key bytes (32-byte seed or 64-byte pair).
pub fn sign(message: &[u8], secret_key: &[u8]) -> Result<Signature, CryptoError> {
    Ok(KeyPair::from_secret_bytes(secret_key)?.sign(message))
}

/// Verify a detached signature from raw bytes.
///
/// Pure predicate: wrong-length signatures, wrong-length keys, and keys that
/// are not curve points all return `false`.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    match (Signature::from_slice(signature), PublicKey::from_slice(public_key)) {
        (Ok(sig), Ok(pk)) => pk.verify(message, &sig),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_sign_and_verify() {
        let kp = KeyPair::generate().unwrap();
        let sig = kp.sign(b"nonce-123");
        assert!(kp.public_key().verify(b"nonce-123", &sig));
        assert!(verify(b"nonce-123", sig.as_bytes(), kp.public_key().as_bytes()));
    }

    #[test]
    fn two_generated_keys_differ() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn wrong_key_or_message_fails() {
        let a = KeyPair::from_seed(&[1u8; 32]);
        let b = KeyPair::from_seed(&[2u8; 32]);
        let sig = a.sign(b"original");
        assert!(!b.public_key().verify(b"original", &sig));
        assert!(!a.public_key().verify(b"tampered", &sig));
    }

    #[test]
    fn verify_never_panics_on_malformed_lengths() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let sig = kp.sign(b"m");
        assert!(!verify(b"m", &sig.as_bytes()[..63], kp.public_key().as_bytes()));
        assert!(!verify(b"m", sig.as_bytes(), &kp.public_key().as_bytes()[..31]));
        assert!(!verify(b"m", &[], &[]));
    }

    #[test]
    fn signing_is_deterministic_for_seed() {
        let a = KeyPair::from_seed(&[42u8; 32]);
        let b = KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign(b"x"), b.sign(b"x"));
    }

    #[test]
    fn secret_export_roundtrips_as_64_bytes() {
        let kp = KeyPair::generate().unwrap();
        let exported = kp.secret_base64();
        let raw = BASE64.decode(exported.as_str()).unwrap();
        assert_eq!(raw.len(), 64);
        assert_eq!(&raw[32..], kp.public_key().as_bytes());

        let restored = KeyPair::from_secret_base64(&exported).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
    }

    #[test]
    fn mismatched_keypair_bytes_rejected() {
        let a = KeyPair::from_seed(&[5u8; 32]);
        let b = KeyPair::from_seed(&[6u8; 32]);
        let mut raw = BASE64.decode(a.secret_base64().as_str()).unwrap();
        raw[32..].copy_from_slice(b.public_key().as_bytes());
        assert!(matches!(
            KeyPair::from_secret_bytes(&raw),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn free_sign_accepts_seed_and_pair() {
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let pair = BASE64.decode(kp.secret_base64().as_str()).unwrap();
        let s1 = sign(b"msg", &[7u8; 32]).unwrap();
        let s2 = sign(b"msg", &pair).unwrap();
        assert_eq!(s1, s2);
        assert!(sign(b"msg", &[0u8; 10]).is_err());
    }

    #[test]
    fn public_key_wrong_length_is_invalid_key_material() {
        let err = PublicKey::from_slice(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyMaterial(_)));
        assert!(PublicKey::from_base64("not base64!").is_err());
    }

    #[test]
    fn serde_uses_base64_strings() {
        let kp = KeyPair::from_seed(&[9u8; 32]);
        let pk = kp.public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_base64()));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);

        let sig = kp.sign(b"z");
        let back: Signature = serde_json::from_str(&serde_json::to_string(&sig).unwrap()).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = KeyPair::from_seed(&[1u8; 32]);
        assert_eq!(format!("{kp:?}"), "KeyPair(<private>)");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sign_then_verify_holds(seed in any::<[u8; 32]>(), msg in prop::collection::vec(any::<u8>(), 0..256)) {
            let kp = KeyPair::from_seed(&seed);
            let sig = kp.sign(&msg);
            prop_assert!(verify(&msg, sig.as_bytes(), kp.public_key().as_bytes()));
        }

        #[test]
        fn any_single_bit_flip_breaks_verification(
            seed in any::<[u8; 32]>(),
            msg in prop::collection::vec(any::<u8>(), 1..128),
            target in 0usize..3,
            bit in any::<prop::sample::Index>(),
        ) {
            let kp = KeyPair::from_seed(&seed);
            let mut m = msg.clone();
            let mut s = kp.sign(&msg).as_bytes().to_vec();
            let mut p = kp.public_key().as_bytes().to_vec();
            let buf = match target {
                0 => &mut m,
                1 => &mut s,
                _ => &mut p,
            };
            let i = bit.index(buf.len() * 8);
            buf[i / 8] ^= 1 << (i % 8);
            prop_assert!(!verify(&m, &s, &p));
        }
    }
}

//! # Verifier Side
//!
//! A verifier issues a fresh challenge, receives a bound proof (or its QR
//! payload), and accepts it when:
//!
//! 1. it is bound to this verifier's DID and to the issued challenge,
//! 2. it has not expired,
//! 3. its threshold is at least the verifier's requirement,
//! 4. the nullifier has not been presented before.
//!
//! With the full bound proof the verifier also recomputes the nullifier from
//! the secret material. A QR payload omits that secret, so the check is
//! skipped there.
//!
//! The ledger is shared behind a `parking_lot::Mutex`; a nullifier is
//! recorded only when every other check passes.

use std::collections::HashSet;

use parking_lot::Mutex;

use amw_core::{Did, Timestamp};

use crate::engine::compute_nullifier;
use crate::error::VerifyError;
use crate::proof::BoundProof;
use crate::qr::ProofQrPayload;

/// Nullifiers already accepted by one verifier.
#[derive(Debug, Default)]
pub struct NullifierLedger {
    seen: Mutex<HashSet<String>>,
}

impl NullifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `nullifier`. Returns `false` if it was already present.
    pub fn record(&self, nullifier: &str) -> bool {
        self.seen.lock().insert(nullifier.to_ascii_lowercase())
    }

    pub fn contains(&self, nullifier: &str) -> bool {
        self.seen.lock().contains(&nullifier.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct ProofVerifier {
    verifier: Did,
    min_threshold: u32,
    ledger: NullifierLedger,
}

struct Presented<'a> {
    verifier: &'a Did,
    challenge: &'a str,
    threshold: u32,
    expires_at: Timestamp,
    nullifier: &'a str,
}

impl ProofVerifier {
    pub fn new(verifier: Did, min_threshold: u32) -> Self {
        Self {
            verifier,
            min_threshold,
            ledger: NullifierLedger::new(),
        }
    }

    pub fn did(&self) -> &Did {
        &self.verifier
    }

    pub fn ledger(&self) -> &NullifierLedger {
        &self.ledger
    }

    /// Verify a full bound proof, including nullifier recomputation.
    pub fn verify(
        &self,
        proof: &BoundProof,
        expected_challenge: &str,
        now: Timestamp,
    ) -> Result<(), VerifyError> {
        let base = &proof.base_proof;
        let presented = Presented {
            verifier: proof.verifier(),
            challenge: &proof.challenge,
            threshold: base.predicate_inputs.age_threshold,
            expires_at: base.expires_at(),
            nullifier: &proof.nullifier,
        };
        self.check_public(&presented, expected_challenge, now)?;

        let expected = compute_nullifier(&base.secret_material, &proof.challenge, proof.verifier());
        if !expected.eq_ignore_ascii_case(&proof.nullifier) {
            tracing::warn!(verifier = %self.verifier, "nullifier mismatch");
            return Err(VerifyError::NullifierMismatch);
        }
        self.accept(&proof.nullifier)
    }

    /// Verify a scanned QR payload.
    pub fn verify_payload(
        &self,
        payload: &ProofQrPayload,
        expected_challenge: &str,
        now: Timestamp,
    ) -> Result<(), VerifyError> {
        let presented = Presented {
            verifier: &payload.verifier,
            challenge: &payload.challenge,
            threshold: payload.inputs.threshold,
            expires_at: payload.expires_at,
            nullifier: &payload.nullifier,
        };
        self.check_public(&presented, expected_challenge, now)?;
        self.accept(&payload.nullifier)
    }

    fn check_public(
        &self,
        p: &Presented<'_>,
        expected_challenge: &str,
        now: Timestamp,
    ) -> Result<(), VerifyError> {
        if p.verifier != &self.verifier {
            return Err(VerifyError::WrongVerifier(p.verifier.to_string()));
        }
        if p.challenge != expected_challenge {
            return Err(VerifyError::WrongChallenge);
        }
        if now > p.expires_at {
            return Err(VerifyError::Expired(p.expires_at.to_string()));
        }
        if p.threshold < self.min_threshold {
            return Err(VerifyError::ThresholdTooLow {
                got: p.threshold,
                required: self.min_threshold,
            });
        }
        if self.ledger.contains(p.nullifier) {
            return Err(VerifyError::Replay);
        }
        Ok(())
    }

    fn accept(&self, nullifier: &str) -> Result<(), VerifyError> {
        if !self.ledger.record(nullifier) {
            return Err(VerifyError::Replay);
        }
        tracing::info!(verifier = %self.verifier, "proof accepted");
        Ok(())
    }
}

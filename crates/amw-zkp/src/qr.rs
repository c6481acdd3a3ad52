//! Compact proof payload shown to a verifier as a QR code.
//!
//! Carries only public material: commitment, proof blob, challenge,
//! nullifier, threshold and evaluation time. The nullifier secret and the
//! birth date never appear.

use serde::{Deserialize, Serialize};

use amw_core::{Did, Timestamp};

use crate::error::ProofError;
use crate::proof::{epoch_secs, BoundProof, ProofType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrInputs {
    pub threshold: u32,
    #[serde(with = "epoch_secs")]
    pub ts: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProofQrPayload {
    pub v: u32,
    #[serde(rename = "type")]
    pub proof_type: ProofType,
    pub commitment: String,
    pub proof: String,
    pub challenge: String,
    pub nullifier: String,
    pub inputs: QrInputs,
    pub prover: Did,
    pub verifier: Did,
    pub expires_at: Timestamp,
}

impl ProofQrPayload {
    pub fn from_bound(bound: &BoundProof) -> Self {
        let base = &bound.base_proof;
        Self {
            v: base.version,
            proof_type: base.proof_type,
            commitment: base.commitment.clone(),
            proof: base.proof_blob.clone(),
            challenge: bound.challenge.clone(),
            nullifier: bound.nullifier.clone(),
            inputs: QrInputs {
                threshold: base.predicate_inputs.age_threshold,
                ts: base.predicate_inputs.current_timestamp,
            },
            prover: base.prover().clone(),
            verifier: bound.verifier().clone(),
            expires_at: base.expires_at(),
        }
    }

    pub fn to_payload(&self) -> Result<String, ProofError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(raw: &str) -> Result<Self, ProofError> {
        Ok(serde_json::from_str(raw.trim())?)
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

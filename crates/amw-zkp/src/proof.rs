//! # Proof Artifacts
//!
//! Wire shapes:
//!
//! ```json
//! {
//!   "version": 1,
//!   "proofType": "age_over_20",
//!   "nullifierSecret": "<hex>",
//!   "merkleProof": "<hex commitment>",
//!   "proof": "<hex>",
//!   "publicInputs": { "ageThreshold": 20, "currentTimestamp": 1717200000 },
//!   "metadata": { "generatedAt": "...Z", "proverDID": "did:...", "expiresAt": "...Z" }
//! }
//! ```
//!
//! A bound proof wraps the base proof with `challenge`, `nullifierHash`, and
//! `verifierInfo { verifierDID, challengeTimestamp }`. Numeric timestamps
//! are Unix seconds.
//!
//! `nullifierSecret` stays on the holder's device. Only the derived
//! nullifier is shown to verifiers (see [`crate::qr`]).

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use amw_core::{Did, Timestamp};

pub const PROOF_VERSION: u32 = 1;

/// The public predicate, rendered `age_over_<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProofType {
    pub threshold: u32,
}

impl ProofType {
    const PREFIX: &'static str = "age_over_";

    pub fn age_over(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.threshold)
    }
}

impl std::str::FromStr for ProofType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .and_then(|t| t.parse::<u32>().ok())
            .map(Self::age_over)
            .ok_or_else(|| format!("unknown proof type {s:?}"))
    }
}

impl Serialize for ProofType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProofType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: [`Timestamp`] as Unix seconds.
pub(crate) mod epoch_secs {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(ts.epoch_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Timestamp::from_epoch_secs(secs).map_err(serde::de::Error::custom)
    }
}

/// Public inputs of the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateInputs {
    pub age_threshold: u32,
    /// Evaluation time.
    #[serde(with = "epoch_secs")]
    pub current_timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofMetadata {
    pub generated_at: Timestamp,
    #[serde(rename = "proverDID")]
    pub prover_did: Did,
    pub expires_at: Timestamp,
}

/// Output of the expensive proving phase. Reusable across verifiers until
/// `metadata.expires_at`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProof {
    pub version: u32,
    pub proof_type: ProofType,
    /// Nullifier seed. Never leaves the holder's device.
    #[serde(rename = "nullifierSecret")]
    pub secret_material: String,
    #[serde(rename = "merkleProof")]
    pub commitment: String,
    #[serde(rename = "proof")]
    pub proof_blob: String,
    #[serde(rename = "publicInputs")]
    pub predicate_inputs: PredicateInputs,
    pub metadata: ProofMetadata,
}

impl BaseProof {
    pub fn prover(&self) -> &Did {
        &self.metadata.prover_did
    }

    pub fn expires_at(&self) -> Timestamp {
        self.metadata.expires_at
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.metadata.expires_at
    }
}

impl std::fmt::Debug for BaseProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseProof")
            .field("version", &self.version)
            .field("proof_type", &self.proof_type)
            .field("secret_material", &"<redacted>")
            .field("commitment", &self.commitment)
            .field("proof_blob", &self.proof_blob)
            .field("predicate_inputs", &self.predicate_inputs)
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierInfo {
    #[serde(rename = "verifierDID")]
    pub verifier_did: Did,
    /// Binding time.
    #[serde(rename = "challengeTimestamp", with = "epoch_secs")]
    pub binding_timestamp: Timestamp,
}

/// A base proof bound to one verifier's challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundProof {
    pub base_proof: BaseProof,
    pub challenge: String,
    #[serde(rename = "nullifierHash")]
    pub nullifier: String,
    pub verifier_info: VerifierInfo,
}

impl BoundProof {
    pub fn verifier(&self) -> &Did {
        &self.verifier_info.verifier_did
    }
}

/// A base proof together with how long proving took.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub proof: BaseProof,
    pub generation_time: Duration,
}

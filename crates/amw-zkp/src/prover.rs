//! # Prover Backends
//!
//! A [`PredicateProver`] turns a private witness plus public inputs into
//! proof artifacts. The engine only talks to the trait, so the hash mock and
//! a real circuit are interchangeable.
//!
//! ## Mock digests
//!
//! With `‖` the length-prefixed concatenation of
//! [`Sha3Accumulator`](amw_core::Sha3Accumulator) and `now` the evaluation
//! time in RFC 3339:
//!
//! ```text
//! secretMaterial = SHA3-256("nullifier-seed" ‖ proverDID ‖ now)
//! commitment     = SHA3-256("commitment"     ‖ proverDID ‖ now)
//! proofBlob      = SHA3-256("proof" ‖ SHA3-256(birthDate) ‖ proverDID ‖ now)
//! ```
//!
//! Only the hash of the birth date enters a preimage.

use chrono::NaiveDate;

use amw_core::{sha3_256_str_hex, Did, Sha3Accumulator};

use crate::error::ProofError;
use crate::proof::PredicateInputs;

/// The private input. Never serialized, never logged.
#[derive(Clone, Copy)]
pub struct AgeWitness {
    birth_date: NaiveDate,
}

impl AgeWitness {
    pub fn new(birth_date: NaiveDate) -> Self {
        Self { birth_date }
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    /// SHA3-256 hex of the `YYYY-MM-DD` rendering.
    pub fn attribute_hash(&self) -> String {
        sha3_256_str_hex(&self.birth_date.format("%Y-%m-%d").to_string())
    }
}

impl std::fmt::Debug for AgeWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AgeWitness(<private>)")
    }
}

/// Hex digests produced by a prover.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofArtifacts {
    pub secret_material: String,
    pub commitment: String,
    pub proof_blob: String,
}

impl std::fmt::Debug for ProofArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofArtifacts")
            .field("secret_material", &"<redacted>")
            .field("commitment", &self.commitment)
            .field("proof_blob", &self.proof_blob)
            .finish()
    }
}

/// Abstract interface for the proving step.
///
/// Implementations must be deterministic in their inputs and must not
/// check the predicate themselves; the engine does that before calling.
pub trait PredicateProver: Send + Sync {
    fn prove(
        &self,
        witness: &AgeWitness,
        inputs: &PredicateInputs,
        prover: &Did,
    ) -> Result<ProofArtifacts, ProofError>;
}

/// Hash-based stand-in for a circuit. Deterministic, transparent, no
/// zero-knowledge privacy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockHashProver;

impl PredicateProver for MockHashProver {
    fn prove(
        &self,
        witness: &AgeWitness,
        inputs: &PredicateInputs,
        prover: &Did,
    ) -> Result<ProofArtifacts, ProofError> {
        let now = inputs.current_timestamp.to_iso8601();
        let (did, now) = (prover.as_str(), now.as_str());
        Ok(ProofArtifacts {
            secret_material: Sha3Accumulator::labeled(["nullifier-seed", did, now]).to_hex(),
            commitment: Sha3Accumulator::labeled(["commitment", did, now]).to_hex(),
            proof_blob: Sha3Accumulator::labeled([
                "proof",
                witness.attribute_hash().as_str(),
                did,
                now,
            ])
            .to_hex(),
        })
    }
}

/// Placeholder for a real zero-knowledge circuit.
#[derive(Debug, Clone, Default)]
pub struct RealCircuitProver {
    /// Circuit identifier, reported in the error.
    pub circuit: String,
}

impl PredicateProver for RealCircuitProver {
    fn prove(
        &self,
        _witness: &AgeWitness,
        _inputs: &PredicateInputs,
        _prover: &Did,
    ) -> Result<ProofArtifacts, ProofError> {
        let name = if self.circuit.is_empty() {
            "age circuit"
        } else {
            self.circuit.as_str()
        };
        Err(ProofError::BackendUnavailable(format!(
            "{name} is not compiled into this build"
        )))
    }
}

/// The backend selected at engine construction.
#[derive(Debug, Clone)]
pub enum ProverBackend {
    MockHash(MockHashProver),
    RealCircuit(RealCircuitProver),
}

impl Default for ProverBackend {
    fn default() -> Self {
        Self::MockHash(MockHashProver)
    }
}

impl ProverBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MockHash(_) => "mock-hash",
            Self::RealCircuit(_) => "real-circuit",
        }
    }
}

impl PredicateProver for ProverBackend {
    fn prove(
        &self,
        witness: &AgeWitness,
        inputs: &PredicateInputs,
        prover: &Did,
    ) -> Result<ProofArtifacts, ProofError> {
        match self {
            Self::MockHash(p) => p.prove(witness, inputs, prover),
            Self::RealCircuit(p) => p.prove(witness, inputs, prover),
        }
    }
}

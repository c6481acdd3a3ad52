//! # Proof Engine
//!
//! ```text
//! Idle ──compute_base_proof──▶ BaseComputed ──bind_challenge──▶ Bound
//!                                   ▲                              │
//!                                   └──────bind another challenge──┘
//! ```
//!
//! `compute_base_proof` is async and models circuit-proving latency with a
//! timer (base delay plus jitter proportional to a complexity factor). It
//! has no internal concurrency; a caller that loses interest drops the
//! future. The predicate is checked before any delay, so an ineligible
//! holder gets the business-rule error immediately.
//!
//! Binding is pure and fast. The same base proof can be bound to any number
//! of verifiers and challenges, each yielding a distinct nullifier. Expiry is
//! the verifier's concern; binding does not check it.

use std::time::{Duration, Instant};

use rand::Rng;

use amw_core::{Did, Sha3Accumulator, Timestamp};

use crate::age::{age_in_years, satisfies_age};
use crate::error::ProofError;
use crate::proof::{
    BaseProof, BoundProof, GenerationResult, PredicateInputs, ProofMetadata, ProofType,
    VerifierInfo, PROOF_VERSION,
};
use crate::prover::{AgeWitness, PredicateProver, ProverBackend};

/// Simulated proving latency: `base + U[0,1) · complexity · 100 ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyModel {
    pub base: Duration,
    pub complexity: u32,
}

impl LatencyModel {
    const JITTER_UNIT: Duration = Duration::from_millis(100);

    pub fn new(base_delay_ms: u64, complexity: u32) -> Self {
        Self {
            base: Duration::from_millis(base_delay_ms),
            complexity,
        }
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Upper bound of [`sample`](Self::sample).
    pub fn max(&self) -> Duration {
        self.base + Self::JITTER_UNIT * self.complexity
    }

    pub fn sample(&self) -> Duration {
        if self.complexity == 0 {
            return self.base;
        }
        let factor: f64 = rand::thread_rng().gen();
        self.base + (Self::JITTER_UNIT * self.complexity).mul_f64(factor)
    }
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self::new(1000, 20)
    }
}

/// Where the engine is in the two-phase protocol.
#[derive(Debug, Clone, Default)]
pub enum EngineState {
    #[default]
    Idle,
    BaseComputed(BaseProof),
    Bound(BoundProof),
}

impl EngineState {
    /// The base proof available for binding, if any.
    pub fn base_proof(&self) -> Option<&BaseProof> {
        match self {
            Self::Idle => None,
            Self::BaseComputed(base) => Some(base),
            Self::Bound(bound) => Some(&bound.base_proof),
        }
    }
}

/// Drives one holder's proofs through the two phases.
#[derive(Debug)]
pub struct ProofEngine<P: PredicateProver = ProverBackend> {
    prover: P,
    latency: LatencyModel,
    validity: chrono::Duration,
    state: EngineState,
}

impl ProofEngine<ProverBackend> {
    /// Mock backend, default latency, 24 hour validity.
    pub fn mock() -> Self {
        Self::new(ProverBackend::default())
    }
}

impl<P: PredicateProver> ProofEngine<P> {
    pub fn new(prover: P) -> Self {
        Self {
            prover,
            latency: LatencyModel::default(),
            validity: chrono::Duration::hours(24),
            state: EngineState::Idle,
        }
    }

    pub fn with_latency(mut self, latency: LatencyModel) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_validity(mut self, validity: chrono::Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Phase one: prove `age(birth_date, now) ≥ threshold`.
    ///
    /// # Errors
    ///
    /// - [`ProofError::PredicateUnsatisfied`] if the holder is too young.
    ///   Terminal; the state is left unchanged.
    /// - [`ProofError::BackendUnavailable`] from a backend that cannot run.
    /// - [`ProofError::TimestampOverflow`] if the expiry is unrepresentable.
    pub async fn compute_base_proof(
        &mut self,
        birth_date: chrono::NaiveDate,
        prover_did: &Did,
        threshold: u32,
        now: Timestamp,
    ) -> Result<GenerationResult, ProofError> {
        let started = Instant::now();

        if !satisfies_age(birth_date, now.date(), threshold) {
            tracing::warn!(prover = %prover_did, threshold, "age predicate not satisfied");
            return Err(ProofError::PredicateUnsatisfied);
        }

        tokio::time::sleep(self.latency.sample()).await;

        let predicate_inputs = PredicateInputs {
            age_threshold: threshold,
            current_timestamp: now,
        };
        let witness = AgeWitness::new(birth_date);
        let artifacts = self.prover.prove(&witness, &predicate_inputs, prover_did)?;
        let expires_at = now
            .checked_add(self.validity)
            .ok_or(ProofError::TimestampOverflow)?;

        let proof = BaseProof {
            version: PROOF_VERSION,
            proof_type: ProofType::age_over(threshold),
            secret_material: artifacts.secret_material,
            commitment: artifacts.commitment,
            proof_blob: artifacts.proof_blob,
            predicate_inputs,
            metadata: ProofMetadata {
                generated_at: now,
                prover_did: prover_did.clone(),
                expires_at,
            },
        };
        self.state = EngineState::BaseComputed(proof.clone());

        let generation_time = started.elapsed();
        tracing::info!(
            prover = %prover_did,
            proof_type = %proof.proof_type,
            elapsed_ms = generation_time.as_millis() as u64,
            "base proof generated"
        );
        Ok(GenerationResult {
            proof,
            generation_time,
        })
    }

    /// Phase two: bind the current base proof to a verifier's challenge.
    ///
    /// # Errors
    ///
    /// [`ProofError::NoBaseProof`] in the `Idle` state.
    pub fn bind_challenge(
        &mut self,
        challenge: &str,
        verifier: &Did,
        now: Timestamp,
    ) -> Result<BoundProof, ProofError> {
        let base = self.state.base_proof().ok_or(ProofError::NoBaseProof)?;
        let bound = bind_challenge(base, challenge, verifier, now);
        tracing::debug!(verifier = %verifier, "bound challenge");
        self.state = EngineState::Bound(bound.clone());
        Ok(bound)
    }

    /// Back to `Idle`, discarding any base proof.
    pub fn reset(&mut self) {
        self.state = EngineState::Idle;
    }
}

/// `SHA3-256(secretMaterial ‖ challenge ‖ verifierDID)`, hex.
pub fn compute_nullifier(secret_material: &str, challenge: &str, verifier: &Did) -> String {
    Sha3Accumulator::labeled([secret_material, challenge, verifier.as_str()]).to_hex()
}

/// Bind `base` to a challenge. Pure: equal inputs give an equal nullifier.
pub fn bind_challenge(
    base: &BaseProof,
    challenge: &str,
    verifier: &Did,
    now: Timestamp,
) -> BoundProof {
    BoundProof {
        base_proof: base.clone(),
        challenge: challenge.to_string(),
        nullifier: compute_nullifier(&base.secret_material, challenge, verifier),
        verifier_info: VerifierInfo {
            verifier_did: verifier.clone(),
            binding_timestamp: now,
        },
    }
}

/// Whole-year age, exposed for display next to a proof request. Never put
/// into a proof artifact.
pub fn holder_age(birth_date: chrono::NaiveDate, now: Timestamp) -> i32 {
    age_in_years(birth_date, now.date())
}

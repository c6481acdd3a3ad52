//! # amw-zkp — Age Predicate Proofs
//!
//! Proves "age ≥ T" from a credential's birth date without disclosing the
//! date. Proving is split in two phases:
//!
//! 1. **Base proof** ([`ProofEngine::compute_base_proof`]): the expensive
//!    step. Checks the predicate, runs the prover backend, and yields a
//!    [`BaseProof`] valid for a fixed window. Computed once per credential
//!    evaluation.
//! 2. **Challenge binding** ([`bind_challenge`]): cheap and pure. Derives a
//!    nullifier from the base proof's secret material, the verifier's
//!    challenge, and the verifier's DID. A verifier that has seen a
//!    nullifier before rejects it as a replay.
//!
//! ## Backends
//!
//! [`ProverBackend`] selects between [`MockHashProver`] (SHA3 digests,
//! no zero-knowledge property) and [`RealCircuitProver`], which reports
//! itself unavailable until a circuit is wired in. Callers of the engine do
//! not change when the backend does.
//!
//! ## Security Notice
//!
//! The mock backend provides NO zero-knowledge guarantees. Its artifacts
//! never contain the birth date or the exact age, only digests.

pub mod age;
pub mod engine;
pub mod error;
pub mod proof;
pub mod prover;
pub mod qr;
pub mod verifier;

pub use age::{age_in_years, satisfies_age};
pub use engine::{
    bind_challenge, compute_nullifier, holder_age, EngineState, LatencyModel, ProofEngine,
};
pub use error::{ProofError, VerifyError};
pub use proof::{
    BaseProof, BoundProof, GenerationResult, PredicateInputs, ProofMetadata, ProofType,
    VerifierInfo, PROOF_VERSION,
};
pub use prover::{
    AgeWitness, MockHashProver, PredicateProver, ProofArtifacts, ProverBackend, RealCircuitProver,
};
pub use qr::{ProofQrPayload, QrInputs};
pub use verifier::{NullifierLedger, ProofVerifier};

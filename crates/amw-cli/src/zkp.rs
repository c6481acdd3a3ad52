//! # ZKP Subcommand
//!
//! `prove` computes a base proof for a stored credential's birth date,
//! binds it to a verifier's challenge, and prints the proof QR payload.
//! `verify` checks a scanned payload from the verifier's side.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use amw_core::{Did, Timestamp};
use amw_zkp::{ProofEngine, ProofError, ProofQrPayload, ProofVerifier, ProverBackend};

use crate::WalletContext;

#[derive(Args, Debug)]
pub struct ZkpArgs {
    #[command(subcommand)]
    pub command: ZkpCommand,
}

#[derive(Subcommand, Debug)]
pub enum ZkpCommand {
    /// Prove the holder is at least the threshold age.
    Prove {
        /// Holder DID.
        #[arg(long)]
        did: String,
        /// Credential id carrying `birthDate`.
        #[arg(long)]
        vc: String,
        /// Challenge issued by the verifier.
        #[arg(long)]
        challenge: String,
        /// Verifier DID.
        #[arg(long)]
        verifier: String,
        /// Age threshold; defaults to the configured value.
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Check a proof QR payload as a verifier.
    Verify {
        /// Payload JSON as scanned.
        payload: String,
        /// This verifier's DID.
        #[arg(long)]
        verifier: String,
        /// The challenge this verifier issued.
        #[arg(long)]
        challenge: String,
        /// Minimum acceptable threshold; defaults to the configured value.
        #[arg(long)]
        min_threshold: Option<u32>,
    },
}

pub fn run_zkp(args: &ZkpArgs, ctx: &WalletContext) -> Result<u8> {
    match &args.command {
        ZkpCommand::Prove {
            did,
            vc,
            challenge,
            verifier,
            threshold,
        } => {
            let threshold = threshold.unwrap_or(ctx.config.age_threshold);
            match prove(ctx, did, vc, challenge, verifier, threshold, Timestamp::now()) {
                Ok(payload) => {
                    println!("{}", payload.to_payload()?);
                    Ok(0)
                }
                Err(e) if is_predicate_failure(&e) => {
                    println!("FAILED: holder does not satisfy age_over_{threshold}");
                    Ok(2)
                }
                Err(e) => Err(e),
            }
        }
        ZkpCommand::Verify {
            payload,
            verifier,
            challenge,
            min_threshold,
        } => {
            let payload = ProofQrPayload::parse(payload).context("parsing proof payload")?;
            let verifier = ProofVerifier::new(
                Did::new(verifier.as_str()).context("invalid verifier DID")?,
                min_threshold.unwrap_or(ctx.config.age_threshold),
            );
            match verifier.verify_payload(&payload, challenge, Timestamp::now()) {
                Ok(()) => {
                    println!("OK: {} proven for {}", payload.proof_type, payload.prover);
                    Ok(0)
                }
                Err(e) => {
                    println!("FAILED: {e}");
                    Ok(1)
                }
            }
        }
    }
}

fn is_predicate_failure(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ProofError>(),
        Some(ProofError::PredicateUnsatisfied)
    )
}

fn prove(
    ctx: &WalletContext,
    did: &str,
    vc: &str,
    challenge: &str,
    verifier: &str,
    threshold: u32,
    now: Timestamp,
) -> Result<ProofQrPayload> {
    let holder = ctx.identity(did)?;
    let stored = ctx.credential(vc)?;
    if &stored.data.credential_subject.id != holder.id() {
        bail!("credential {vc} was not issued to {did}");
    }
    let birth_date = stored
        .data
        .birth_date()
        .with_context(|| format!("credential {vc} cannot be used for an age proof"))?;
    let verifier = Did::new(verifier).context("invalid verifier DID")?;

    let mut engine = ProofEngine::new(ProverBackend::default())
        .with_latency(ctx.config.proof.latency())
        .with_validity(ctx.config.proof.validity());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("starting proof runtime")?;
    let generated =
        runtime.block_on(engine.compute_base_proof(birth_date, holder.id(), threshold, now))?;
    tracing::info!(
        elapsed_ms = generated.generation_time.as_millis() as u64,
        "base proof ready"
    );

    let bound = engine.bind_challenge(challenge, &verifier, now)?;
    Ok(ProofQrPayload::from_bound(&bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;
    use amw_did::Identity;
    use amw_store::Repository;
    use amw_vc::{StoredCredential, VerifiableCredential};

    fn wallet(birth_date: &str) -> (tempfile::TempDir, WalletContext, Identity, StoredCredential) {
        let (dir, ctx) = context();
        let holder = Identity::generate().unwrap();
        ctx.store.identities.save(holder.clone()).unwrap();
        let vc = VerifiableCredential::sample_resident(holder.id(), Timestamp::now())
            .unwrap()
            .with_attribute("birthDate", birth_date);
        let stored = StoredCredential::new("test", vc);
        ctx.store.credentials.save(stored.clone()).unwrap();
        (dir, ctx, holder, stored)
    }

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn adult_proves_and_verifier_accepts_once() {
        let (_dir, ctx, holder, stored) = wallet("1990-05-15");
        let now = at("2024-06-01T00:00:00Z");
        let payload = prove(
            &ctx,
            holder.id().as_str(),
            stored.id().as_str(),
            "c-1",
            "did:amatelus:shop",
            20,
            now,
        )
        .unwrap();

        let verifier = ProofVerifier::new(Did::new("did:amatelus:shop").unwrap(), 20);
        assert!(verifier.verify_payload(&payload, "c-1", now).is_ok());
        assert!(verifier.verify_payload(&payload, "c-1", now).is_err());
    }

    #[test]
    fn minor_gets_predicate_failure() {
        let (_dir, ctx, holder, stored) = wallet("2009-06-01");
        let err = prove(
            &ctx,
            holder.id().as_str(),
            stored.id().as_str(),
            "c",
            "did:amatelus:shop",
            20,
            at("2024-06-01T00:00:00Z"),
        )
        .unwrap_err();
        assert!(is_predicate_failure(&err));
    }

    #[test]
    fn credential_of_another_holder_is_refused() {
        let (_dir, ctx, _holder, stored) = wallet("1990-05-15");
        let other = Identity::generate().unwrap();
        ctx.store.identities.save(other.clone()).unwrap();
        let err = prove(
            &ctx,
            other.id().as_str(),
            stored.id().as_str(),
            "c",
            "did:amatelus:shop",
            20,
            Timestamp::now(),
        )
        .unwrap_err();
        assert!(!is_predicate_failure(&err));
    }

    #[test]
    fn bad_verifier_did_is_an_error() {
        let (_dir, ctx, holder, stored) = wallet("1990-05-15");
        assert!(prove(
            &ctx,
            holder.id().as_str(),
            stored.id().as_str(),
            "c",
            "shop",
            20,
            Timestamp::now(),
        )
        .is_err());
    }
}

//! # VC Subcommand
//!
//! Credential storage and chunked QR transfer. `split` prints one payload
//! per line, manifest first; `receive` reads that same format back, so a
//! transfer can be replayed from a file of scanned payloads.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use amw_core::{Did, Timestamp};
use amw_store::Repository;
use amw_vc::{split, CredentialReceiver, PartOutcome, StoredCredential, VerifiableCredential};

use crate::WalletContext;

#[derive(Args, Debug)]
pub struct VcArgs {
    #[command(subcommand)]
    pub command: VcCommand,
}

#[derive(Subcommand, Debug)]
pub enum VcCommand {
    /// Issue the sample resident credential to a wallet identity.
    Sample {
        /// Holder DID; must be an identity in this wallet.
        holder: String,
    },

    /// List stored credentials.
    List,

    /// Remove a stored credential.
    Remove {
        /// Credential id.
        id: String,
    },

    /// Print the QR payloads for sending a credential, one per line.
    Split {
        /// Credential id.
        id: String,
        /// Largest chunk per part; defaults to the configured value.
        #[arg(long)]
        max_part_bytes: Option<usize>,
    },

    /// Reassemble a credential from scanned payloads and store it.
    Receive {
        /// File with one scanned payload per line, manifest first.
        file: PathBuf,
    },
}

pub fn run_vc(args: &VcArgs, ctx: &WalletContext) -> Result<u8> {
    match &args.command {
        VcCommand::Sample { holder } => cmd_sample(ctx, holder).map(|_| 0),
        VcCommand::List => cmd_list(ctx),
        VcCommand::Remove { id } => {
            if !ctx.store.credentials.remove(id)? {
                bail!("no credential {id} in wallet");
            }
            println!("OK: removed {id}");
            Ok(0)
        }
        VcCommand::Split { id, max_part_bytes } => {
            let max = max_part_bytes.unwrap_or(ctx.config.max_part_bytes);
            for payload in split_payloads(ctx, id, max)? {
                println!("{payload}");
            }
            Ok(0)
        }
        VcCommand::Receive { file } => cmd_receive(ctx, file).map(|_| 0),
    }
}

fn cmd_sample(ctx: &WalletContext, holder: &str) -> Result<StoredCredential> {
    let holder = ctx.identity(holder)?;
    let vc = VerifiableCredential::sample_resident(holder.id(), Timestamp::now())
        .context("building sample credential")?;
    let stored = StoredCredential::new(StoredCredential::SAMPLE_TITLE, vc);
    ctx.store.credentials.save(stored.clone())?;
    println!("{}", stored.id());
    Ok(stored)
}

fn cmd_list(ctx: &WalletContext) -> Result<u8> {
    let credentials = ctx.store.credentials.load_all()?;
    if credentials.is_empty() {
        println!("No credentials found.");
        return Ok(0);
    }
    for stored in &credentials {
        let subject: &Did = &stored.data.credential_subject.id;
        println!("{}  {}  subject={}", stored.id(), stored.title, subject);
    }
    Ok(0)
}

fn split_payloads(ctx: &WalletContext, id: &str, max_part_bytes: usize) -> Result<Vec<String>> {
    let stored = ctx.credential(id)?;
    let plan = split(&stored.data, max_part_bytes).context("splitting credential")?;
    tracing::info!(credential = %id, parts = plan.manifest.total_parts, "prepared transfer");
    Ok(plan.payloads())
}

fn cmd_receive(ctx: &WalletContext, file: &Path) -> Result<StoredCredential> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading payload file: {}", file.display()))?;
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

    let mut receiver = CredentialReceiver::with_max_parts(ctx.config.max_transfer_parts);
    let first = lines.next().context("payload file is empty")?;
    receiver.on_manifest(first).context("first payload")?;

    for (n, line) in lines.enumerate() {
        let outcome = receiver
            .on_part(line)
            .with_context(|| format!("payload {}", n + 2))?;
        match outcome {
            PartOutcome::Progress { held, total } => {
                tracing::debug!(held, total, "receiving");
            }
            PartOutcome::Complete(vc) => {
                let stored = StoredCredential::received(*vc);
                ctx.store.credentials.save(stored.clone())?;
                println!("{}", stored.id());
                return Ok(stored);
            }
        }
    }

    let err = receiver
        .try_reconstruct()
        .err()
        .context("transfer finished without completing")?;
    Err(err).context("transfer incomplete")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;
    use amw_did::Identity;

    fn wallet_with_sample() -> (tempfile::TempDir, WalletContext, StoredCredential) {
        let (dir, ctx) = context();
        let identity = Identity::generate().unwrap();
        ctx.store.identities.save(identity.clone()).unwrap();
        let stored = cmd_sample(&ctx, identity.id().as_str()).unwrap();
        (dir, ctx, stored)
    }

    #[test]
    fn sample_requires_known_holder() {
        let (_dir, ctx) = context();
        assert!(cmd_sample(&ctx, "did:amatelus:stranger").is_err());
    }

    #[test]
    fn sample_is_stored_with_title() {
        let (_dir, ctx, stored) = wallet_with_sample();
        let loaded = ctx.credential(stored.id().as_str()).unwrap();
        assert_eq!(loaded.title, StoredCredential::SAMPLE_TITLE);
        assert!(loaded.data.has_birth_date());
    }

    #[test]
    fn split_then_receive_out_of_order() {
        let (dir, ctx, stored) = wallet_with_sample();
        let payloads = split_payloads(&ctx, stored.id().as_str(), 120).unwrap();
        assert!(payloads.len() > 3);

        ctx.store.credentials.remove(stored.id().as_str()).unwrap();

        let mut shuffled = vec![payloads[0].clone()];
        shuffled.extend(payloads[1..].iter().rev().cloned());
        let file = dir.path().join("scan.txt");
        std::fs::write(&file, shuffled.join("\n\n")).unwrap();

        let received = cmd_receive(&ctx, &file).unwrap();
        assert_eq!(received.data, stored.data);
        assert_eq!(received.title, StoredCredential::RECEIVED_TITLE);
        assert_eq!(ctx.store.credentials.load_all().unwrap().len(), 1);
    }

    #[test]
    fn receive_reports_missing_parts() {
        let (dir, ctx, stored) = wallet_with_sample();
        let payloads = split_payloads(&ctx, stored.id().as_str(), 120).unwrap();
        let file = dir.path().join("scan.txt");
        let without_first_part: Vec<_> = std::iter::once(&payloads[0])
            .chain(&payloads[2..])
            .cloned()
            .collect();
        std::fs::write(&file, without_first_part.join("\n")).unwrap();

        let err = cmd_receive(&ctx, &file).unwrap_err();
        assert!(format!("{err:#}").contains("missing parts: 0"));
    }

    #[test]
    fn receive_rejects_bad_manifest() {
        let (dir, ctx) = context();
        let file = dir.path().join("scan.txt");
        std::fs::write(&file, "[0,\"x\"]\n").unwrap();
        let err = cmd_receive(&ctx, &file).unwrap_err();
        assert!(format!("{err:#}").contains("invalid metadata"));

        std::fs::write(&file, "").unwrap();
        assert!(cmd_receive(&ctx, &file).is_err());
    }

    #[test]
    fn receive_honours_configured_part_cap() {
        let (dir, mut ctx, stored) = wallet_with_sample();
        let payloads = split_payloads(&ctx, stored.id().as_str(), 120).unwrap();
        let file = dir.path().join("scan.txt");
        std::fs::write(&file, payloads.join("\n")).unwrap();

        ctx.config.max_transfer_parts = payloads.len() - 2;
        let err = cmd_receive(&ctx, &file).unwrap_err();
        assert!(format!("{err:#}").contains("invalid metadata"));

        ctx.config.max_transfer_parts = payloads.len() - 1;
        assert_eq!(cmd_receive(&ctx, &file).unwrap().data, stored.data);
    }
}

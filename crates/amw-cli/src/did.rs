//! # DID Subcommand
//!
//! - `generate`: create an identity and store it.
//! - `list`: list stored identities.
//! - `remove`: delete an identity.
//! - `qr`: print the public identity payload `[1, "<publicKey>"]`.
//! - `sign-nonce`: answer a verifier's nonce with a signature.
//! - `verify-possession`: check a presented nonce signature.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use amw_core::short_did;
use amw_did::{parse_public_identity, Identity, PossessionResponse};
use amw_store::Repository;

use crate::WalletContext;

#[derive(Args, Debug)]
pub struct DidArgs {
    #[command(subcommand)]
    pub command: DidCommand,
}

#[derive(Subcommand, Debug)]
pub enum DidCommand {
    /// Generate a new identity.
    Generate,

    /// List stored identities.
    List,

    /// Remove an identity.
    Remove {
        /// Full DID.
        id: String,
    },

    /// Print the public identity QR payload.
    Qr {
        /// Full DID.
        id: String,
    },

    /// Sign a verifier's nonce with an identity's key.
    SignNonce {
        /// Full DID.
        id: String,
        /// Nonce as scanned.
        nonce: String,
    },

    /// Verify a possession response JSON.
    VerifyPossession {
        /// `{"nonce","signature","publicKey"}` as presented.
        response: String,
        /// Expected public identity payload or bare base64 key.
        #[arg(long)]
        expected: Option<String>,
        /// Nonce this verifier issued.
        #[arg(long)]
        nonce: Option<String>,
    },
}

pub fn run_did(args: &DidArgs, ctx: &WalletContext) -> Result<u8> {
    match &args.command {
        DidCommand::Generate => cmd_generate(ctx).map(|_| 0),
        DidCommand::List => cmd_list(ctx),
        DidCommand::Remove { id } => cmd_remove(ctx, id),
        DidCommand::Qr { id } => {
            println!("{}", ctx.identity(id)?.public_identity_payload());
            Ok(0)
        }
        DidCommand::SignNonce { id, nonce } => {
            let response = PossessionResponse::respond(&ctx.identity(id)?, nonce)
                .context("signing nonce")?;
            println!("{}", serde_json::to_string(&response)?);
            Ok(0)
        }
        DidCommand::VerifyPossession {
            response,
            expected,
            nonce,
        } => cmd_verify_possession(response, expected.as_deref(), nonce.as_deref()),
    }
}

fn cmd_generate(ctx: &WalletContext) -> Result<Identity> {
    let identity = Identity::generate().context("generating identity")?;
    ctx.store
        .identities
        .save(identity.clone())
        .context("saving identity")?;
    println!("{}", identity.id());
    Ok(identity)
}

fn cmd_list(ctx: &WalletContext) -> Result<u8> {
    let identities = ctx.store.identities.load_all()?;
    if identities.is_empty() {
        println!("No identities found.");
        return Ok(0);
    }
    for identity in &identities {
        println!("{}  {}", short_did(identity.id()), identity.id());
    }
    Ok(0)
}

fn cmd_remove(ctx: &WalletContext, id: &str) -> Result<u8> {
    if !ctx.store.identities.remove(id)? {
        bail!("no identity {id} in wallet");
    }
    println!("OK: removed {id}");
    Ok(0)
}

fn cmd_verify_possession(raw: &str, expected: Option<&str>, nonce: Option<&str>) -> Result<u8> {
    let response: PossessionResponse =
        serde_json::from_str(raw.trim()).context("parsing possession response")?;

    if let Some(nonce) = nonce {
        if !response.answers(nonce) {
            println!("FAILED: response answers a different nonce");
            return Ok(1);
        }
    }
    let valid = match expected {
        Some(key) => {
            let key = if key.trim_start().starts_with('[') {
                parse_public_identity(key)?
            } else {
                amw_crypto::PublicKey::from_base64(key.trim()).context("parsing expected key")?
            };
            response.verify_against(&key)
        }
        None => response.verify(),
    };

    if valid {
        println!("OK: signature valid for {}", response.public_key);
        Ok(0)
    } else {
        println!("FAILED: signature invalid");
        Ok(1)
    }
}

//! # amw CLI entry point
//!
//! Parses arguments, resolves configuration, and dispatches to the
//! subcommand handlers in the library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amw_cli::did::{run_did, DidArgs};
use amw_cli::vc::{run_vc, VcArgs};
use amw_cli::zkp::{run_zkp, ZkpArgs};
use amw_cli::{WalletConfig, WalletContext};

/// Amatelus citizen wallet.
///
/// Holds decentralized identifiers and verifiable credentials, moves
/// credentials between devices as a sequence of QR payloads, and proves age
/// predicates to verifiers without revealing the birth date.
#[derive(Parser, Debug)]
#[command(name = "amw", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Wallet data directory; overrides configuration and environment.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identity generation and proof of possession.
    Did(DidArgs),

    /// Credential storage and QR transfer.
    Vc(VcArgs),

    /// Age predicate proofs.
    Zkp(ZkpArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match WalletConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "opening wallet");
    let ctx = WalletContext::new(config);

    let result = match cli.command {
        Commands::Did(args) => run_did(&args, &ctx),
        Commands::Vc(args) => run_vc(&args, &ctx),
        Commands::Zkp(args) => run_zkp(&args, &ctx),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

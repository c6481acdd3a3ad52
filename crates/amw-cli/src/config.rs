//! # Wallet Configuration
//!
//! Resolved in three layers: built-in defaults, then an optional YAML file
//! (`--config`), then `AMW_*` environment variables. A value that fails to
//! parse or validate is an error, never a silent fallback.
//!
//! ```yaml
//! data_dir: ~/.amw
//! max_part_bytes: 500
//! max_transfer_parts: 4096
//! age_threshold: 20
//! proof:
//!   base_delay_ms: 1000
//!   complexity: 20
//!   validity_hours: 24
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use amw_vc::Manifest;
use amw_zkp::LatencyModel;

pub const ENV_DATA_DIR: &str = "AMW_DATA_DIR";
pub const ENV_MAX_PART_BYTES: &str = "AMW_MAX_PART_BYTES";
pub const ENV_MAX_TRANSFER_PARTS: &str = "AMW_MAX_TRANSFER_PARTS";
pub const ENV_AGE_THRESHOLD: &str = "AMW_AGE_THRESHOLD";
pub const ENV_PROOF_BASE_DELAY_MS: &str = "AMW_PROOF_BASE_DELAY_MS";
pub const ENV_PROOF_COMPLEXITY: &str = "AMW_PROOF_COMPLEXITY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Directory holding `dids.json` and `credentials.json`.
    pub data_dir: PathBuf,
    /// Largest chunk per transport part, in bytes.
    pub max_part_bytes: usize,
    /// Largest `totalParts` a scanned manifest may announce.
    pub max_transfer_parts: usize,
    /// Default age predicate threshold, in years.
    pub age_threshold: u32,
    pub proof: ProofConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProofConfig {
    pub base_delay_ms: u64,
    /// Jitter factor: up to `complexity · 100 ms` on top of the base delay.
    pub complexity: u32,
    pub validity_hours: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".amw"),
            max_part_bytes: 500,
            max_transfer_parts: Manifest::DEFAULT_MAX_PARTS,
            age_threshold: 20,
            proof: ProofConfig::default(),
        }
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            complexity: 20,
            validity_hours: 24,
        }
    }
}

impl ProofConfig {
    pub fn latency(&self) -> LatencyModel {
        LatencyModel::new(self.base_delay_ms, self.complexity)
    }

    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.validity_hours))
    }
}

impl WalletConfig {
    /// Defaults, overlaid with `file` if given, overlaid with the process
    /// environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// [`load`](Self::load) with an injectable environment.
    pub fn resolve(file: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file: {}", path.display()))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = env(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        override_from(&env, ENV_MAX_PART_BYTES, &mut self.max_part_bytes)?;
        override_from(&env, ENV_MAX_TRANSFER_PARTS, &mut self.max_transfer_parts)?;
        override_from(&env, ENV_AGE_THRESHOLD, &mut self.age_threshold)?;
        override_from(&env, ENV_PROOF_BASE_DELAY_MS, &mut self.proof.base_delay_ms)?;
        override_from(&env, ENV_PROOF_COMPLEXITY, &mut self.proof.complexity)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_part_bytes == 0 {
            bail!("max_part_bytes must be positive");
        }
        if self.max_transfer_parts == 0 {
            bail!("max_transfer_parts must be positive");
        }
        if self.proof.validity_hours == 0 {
            bail!("proof.validity_hours must be positive");
        }
        if self.data_dir.as_os_str().is_empty() {
            bail!("data_dir must not be empty");
        }
        Ok(())
    }
}

fn override_from<T>(env: &impl Fn(&str) -> Option<String>, name: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = env(name) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}"))?;
    }
    Ok(())
}

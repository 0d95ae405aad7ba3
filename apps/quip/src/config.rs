//! # Configuration Module
//!
//! TOML-backed configuration for the Quip binary.
//!
//! Every quota and model tunable lives here rather than in code: cost per
//! fetch call, daily call budget, snippets per call, per-item snippet cap,
//! max items per cycle and the chain length K. Missing file or missing
//! fields fall back to defaults; `QUIP_API_KEY` overrides the configured
//! API key.

use quip_core::QuipError;
use quip_core::primitives::{DEFAULT_CHAIN_LEN, DEFAULT_MAX_GENERATION_STEPS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file consulted when no `--config` flag is given.
pub const DEFAULT_CONFIG_PATH: &str = "quip.toml";

/// Environment variable overriding the configured API key.
pub const API_KEY_ENV: &str = "QUIP_API_KEY";

// =============================================================================
// TOP-LEVEL CONFIG
// =============================================================================

/// Full configuration of the Quip binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuipConfig {
    /// API key for the discovery/fetch collaborators.
    pub api_key: Option<String>,
    /// Chain length K: number of preceding tokens forming a lookup key.
    pub chain_len: usize,
    /// Hard cap on generation walk steps.
    pub max_generation_steps: usize,
    /// Harvest quota and policy tunables.
    pub harvest: HarvestConfig,
    /// Durable state locations.
    pub storage: StorageConfig,
}

impl Default for QuipConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            chain_len: DEFAULT_CHAIN_LEN,
            max_generation_steps: DEFAULT_MAX_GENERATION_STEPS,
            harvest: HarvestConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl QuipConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse; without one, the default path
    /// is used when present and built-in defaults otherwise. The
    /// `QUIP_API_KEY` environment variable overrides the file value either
    /// way.
    pub fn load(path: Option<&Path>) -> Result<Self, QuipError> {
        let mut config = match path {
            Some(explicit) => Self::parse_file(explicit)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::parse_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, QuipError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QuipError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            QuipError::SerializationError(format!("Invalid config '{}': {}", path.display(), e))
        })
    }
}

// =============================================================================
// HARVEST TUNABLES
// =============================================================================

/// Quota accounting and failure policy for harvest cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// API quota units charged per fetch call.
    pub cost_per_fetch_call: u64,
    /// Maximum quota units spendable per day.
    pub daily_call_budget: u64,
    /// Snippets returned by one fetch call.
    pub snippets_per_fetch_call: u64,
    /// Maximum snippets requested per item.
    pub per_item_snippet_cap: u64,
    /// Maximum items processed in one cycle.
    pub max_items_per_cycle: usize,
    /// Timeout applied to each collaborator call, in seconds.
    pub request_timeout_secs: u64,
    /// What to do when fetching one item's snippets fails.
    pub on_fetch_error: FetchFailurePolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cost_per_fetch_call: 1,
            daily_call_budget: 10_000,
            snippets_per_fetch_call: 100,
            per_item_snippet_cap: 100,
            max_items_per_cycle: 50,
            request_timeout_secs: 10,
            on_fetch_error: FetchFailurePolicy::SkipItem,
        }
    }
}

impl HarvestConfig {
    /// Maximum fetchable snippet count per day.
    ///
    /// `ceiling = (daily call budget / cost per fetch call) * snippets per
    /// fetch call`. A zero cost is treated as 1 to keep the ratio defined.
    #[must_use]
    pub fn quota_ceiling(&self) -> u64 {
        (self.daily_call_budget / self.cost_per_fetch_call.max(1))
            .saturating_mul(self.snippets_per_fetch_call)
    }

    /// Per-call collaborator timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Policy for a single item's fetch failure inside a cycle.
///
/// The two observed deployments of this system disagreed implicitly; here
/// it is an explicit choice. Both paths persist whatever progress was
/// already committed in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchFailurePolicy {
    /// Abort the whole cycle on the first failed item.
    AbortCycle,
    /// Log, skip the item, and continue with the rest of the batch.
    SkipItem,
}

// =============================================================================
// STORAGE LOCATIONS
// =============================================================================

/// Locations of the three durable state files.
///
/// The three writes are independent, not a transaction; the corpus log is
/// the designated source of truth for recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// The persisted transition map (JSON document).
    pub map_path: PathBuf,
    /// The harvested-ID index (sorted JSON array).
    pub ids_path: PathBuf,
    /// The append-only raw corpus log (JSON lines).
    pub corpus_log_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("data/quip-map.json"),
            ids_path: PathBuf::from("data/quip-harvested.json"),
            corpus_log_path: PathBuf::from("data/quip-corpus.jsonl"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Harvest Orchestrator
//!
//! The quota-aware fetch/update/persist cycle around the transition model.
//!
//! One cycle: discover candidate items, drop the already-harvested ones,
//! fetch each remaining item's snippets under the daily quota ceiling, feed
//! every snippet into the transition map, log it to the corpus, and persist
//! the durable state. The orchestrator is a small state machine; a cycle
//! may start only from `Idle` or from `Error` (retry after a failed cycle).
//!
//! Collaborators (discovery and snippet fetching) are trait parameters of
//! [`Harvester::run_cycle`], so offline commands never need a network
//! client and tests inject mocks. Every collaborator call is wrapped in a
//! timeout.

use crate::config::{FetchFailurePolicy, QuipConfig};
use crate::storage::StorageAdapter;
use quip_core::{
    CorpusRecord, HarvestedSet, ModelMetrics, QuipError, TransitionMap, VideoId,
    harvested_from_json, harvested_to_json, map_from_json, map_to_json, record_from_line,
    record_to_line,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

fn storage_err(e: QuipError) -> HarvestError {
    HarvestError::Storage(e.to_string())
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Lifecycle state of the harvester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarvestState {
    /// Ready; no cycle running.
    Idle,
    /// Reading durable state from storage.
    Loading,
    /// A fetch/update cycle is running.
    Harvesting,
    /// Writing durable state to storage.
    Persisting,
    /// The last operation failed; a new cycle may be attempted.
    Error,
}

impl fmt::Display for HarvestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Harvesting => "harvesting",
            Self::Persisting => "persisting",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors surfaced by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// An error from the transition model or the persistence formats.
    #[error(transparent)]
    Model(#[from] QuipError),

    /// A cycle was requested while another operation is running.
    #[error("Cannot start a cycle in state '{state}'")]
    CycleInProgress {
        /// The state the harvester was in.
        state: HarvestState,
    },

    /// Candidate discovery failed.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Fetching one item's snippets failed.
    #[error("Fetching snippets for '{video}' failed: {reason}")]
    Fetch {
        /// The item whose fetch failed.
        video: VideoId,
        /// Collaborator-reported reason.
        reason: String,
    },

    /// A collaborator call exceeded the configured timeout.
    #[error("Operation '{operation}' timed out")]
    Timeout {
        /// The collaborator operation that timed out.
        operation: &'static str,
    },

    /// A durable-state read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The configuration is unusable for the requested command.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Source of candidate item identifiers.
#[allow(async_fn_in_trait)]
pub trait Discovery {
    /// List currently trending item identifiers, most popular first.
    async fn list_trending(&self) -> Result<Vec<VideoId>, HarvestError>;
}

/// Source of snippet texts for one item.
#[allow(async_fn_in_trait)]
pub trait SnippetFetcher {
    /// Fetch up to `max_snippets` snippet texts for `video`.
    async fn fetch_snippets(
        &self,
        video: &VideoId,
        max_snippets: u64,
    ) -> Result<Vec<String>, HarvestError>;
}

// =============================================================================
// REPORTS
// =============================================================================

/// Outcome of one harvest cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Identifiers returned by discovery.
    pub candidates: usize,
    /// Previously unseen candidates whose fetch was attempted this cycle.
    pub new_items: usize,
    /// New items whose snippets were folded into the map.
    pub harvested_items: usize,
    /// Snippets fetched across the cycle.
    pub snippets_fetched: u64,
    /// Items skipped because their fetch failed.
    pub skipped_failures: usize,
    /// Maximum snippets fetchable per day under the quota model.
    pub quota_ceiling: u64,
    /// Whether the cycle stopped early to stay under the ceiling.
    pub stopped_at_quota: bool,
}

impl CycleReport {
    fn new(quota_ceiling: u64) -> Self {
        Self {
            candidates: 0,
            new_items: 0,
            harvested_items: 0,
            snippets_fetched: 0,
            skipped_failures: 0,
            quota_ceiling,
            stopped_at_quota: false,
        }
    }
}

/// Snapshot of the model and durable state, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestMetrics {
    /// Statistics of the in-memory transition map.
    pub model: ModelMetrics,
    /// Number of items harvested so far.
    pub harvested_items: usize,
    /// Size of the persisted map document in bytes.
    pub map_file_bytes: u64,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// The harvest orchestrator.
///
/// Owns the in-memory transition map and harvested-ID set; all durable
/// state goes through the injected storage adapter.
#[derive(Debug)]
pub struct Harvester<S: StorageAdapter> {
    config: QuipConfig,
    storage: S,
    state: HarvestState,
    map: TransitionMap,
    harvested: HarvestedSet,
}

impl<S: StorageAdapter> Harvester<S> {
    /// Create a harvester with an empty model.
    pub fn new(config: QuipConfig, storage: S) -> Result<Self, HarvestError> {
        let map = TransitionMap::new(config.chain_len)?;
        Ok(Self {
            config,
            storage,
            state: HarvestState::Idle,
            map,
            harvested: HarvestedSet::new(),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HarvestState {
        self.state
    }

    /// The in-memory transition map.
    #[must_use]
    pub fn map(&self) -> &TransitionMap {
        &self.map
    }

    /// The in-memory harvested-ID set.
    #[must_use]
    pub fn harvested(&self) -> &HarvestedSet {
        &self.harvested
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &QuipConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Load durable state from storage.
    ///
    /// Missing files mean a fresh start. A legacy combined map document is
    /// read transparently and re-persisted in the split layout. Unreadable
    /// or stale state is not fatal: the map (and the harvested IDs recorded
    /// in the log) are reconstituted from the corpus log, falling back to a
    /// fresh empty map when the log is absent too. Only a persist failure
    /// leaves the harvester in `Error`.
    pub fn initialise(&mut self) -> Result<(), HarvestError> {
        self.state = HarvestState::Loading;
        match self.load_durable_state() {
            Ok(()) => {
                self.state = HarvestState::Idle;
                info!(
                    keys = self.map.key_count(),
                    harvested = self.harvested.len(),
                    "Durable state loaded"
                );
                Ok(())
            }
            Err(e) => {
                self.state = HarvestState::Error;
                Err(e)
            }
        }
    }

    fn load_durable_state(&mut self) -> Result<(), HarvestError> {
        let mut needs_persist = false;
        let mut recover_from_log = false;

        match self.storage.read(&self.config.storage.ids_path) {
            Ok(Some(json)) => match harvested_from_json(&json) {
                Ok(ids) => self.harvested = ids,
                Err(e) => {
                    warn!(error = %e, "Harvested-ID index unreadable, reconstituting from the corpus log");
                    recover_from_log = true;
                }
            },
            Ok(None) => {
                // No index yet; IDs recorded in a surviving corpus log must
                // still be honoured so items are never fetched twice.
                let log_bytes = self
                    .storage
                    .file_size(&self.config.storage.corpus_log_path)
                    .unwrap_or(0);
                if log_bytes > 0 {
                    info!("No harvested-ID index found, reconstituting from the corpus log");
                    recover_from_log = true;
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot read harvested-ID index, reconstituting from the corpus log");
                recover_from_log = true;
            }
        }

        match self.storage.read(&self.config.storage.map_path) {
            Ok(Some(json)) => match map_from_json(&json, self.config.chain_len) {
                Ok(loaded) => {
                    if let Some(legacy_ids) = loaded.legacy_harvested {
                        debug!("Migrating legacy combined map document to the split layout");
                        self.harvested.merge(legacy_ids);
                        needs_persist = true;
                    }

                    if loaded.map.chain_len() == self.config.chain_len {
                        self.map = loaded.map;
                    } else {
                        warn!(
                            persisted = loaded.map.chain_len(),
                            configured = self.config.chain_len,
                            "Chain length changed, rebuilding map from the corpus log"
                        );
                        recover_from_log = true;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Map document unreadable, rebuilding from the corpus log");
                    recover_from_log = true;
                }
            },
            Ok(None) => {
                // No map yet; an existing corpus log still implies a model.
                let log_bytes = self
                    .storage
                    .file_size(&self.config.storage.corpus_log_path)
                    .unwrap_or(0);
                if log_bytes > 0 {
                    info!("No map document found, reconstructing from the corpus log");
                    recover_from_log = true;
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot read map document, rebuilding from the corpus log");
                recover_from_log = true;
            }
        }

        if recover_from_log {
            if let Err(e) = self.rebuild_from_log() {
                warn!(error = %e, "Corpus log unreadable, starting with an empty map");
                self.map = TransitionMap::new(self.config.chain_len)?;
            }
            needs_persist = true;
        }

        if needs_persist {
            self.persist()?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rebuild
    // -------------------------------------------------------------------------

    /// Rebuild the transition map from the raw corpus log and re-persist.
    pub fn rebuild(&mut self) -> Result<(), HarvestError> {
        let result = self.rebuild_from_log().and_then(|()| self.persist());
        match result {
            Ok(()) => {
                self.state = HarvestState::Idle;
                info!(keys = self.map.key_count(), "Map rebuilt from corpus log");
                Ok(())
            }
            Err(e) => {
                self.state = HarvestState::Error;
                Err(e)
            }
        }
    }

    /// Replay the corpus log into a fresh map.
    ///
    /// Malformed lines are skipped with a warning rather than aborting the
    /// replay. Identifiers found in the log are merged into the harvested
    /// set, never removed from it: an item whose fetch returned zero
    /// snippets is harvested but leaves no log entry.
    fn rebuild_from_log(&mut self) -> Result<(), HarvestError> {
        let lines = self
            .storage
            .read_lines(&self.config.storage.corpus_log_path)
            .map_err(storage_err)?;

        let mut map = TransitionMap::new(self.config.chain_len)?;
        let mut logged_ids = HarvestedSet::new();

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match record_from_line(line) {
                Ok(record) => {
                    map.update(&record.text);
                    logged_ids.insert(record.video_id);
                }
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping malformed corpus record");
                }
            }
        }

        self.map = map;
        self.harvested.merge(logged_ids);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Write the map document and the harvested-ID index.
    ///
    /// The corpus log is append-only and already written during the cycle;
    /// the two files written here are derived state.
    pub fn persist(&mut self) -> Result<(), HarvestError> {
        let map_json = map_to_json(&self.map)?;
        self.storage
            .write(&self.config.storage.map_path, &map_json)
            .map_err(storage_err)?;

        let ids_json = harvested_to_json(&self.harvested)?;
        self.storage
            .write(&self.config.storage.ids_path, &ids_json)
            .map_err(storage_err)?;

        debug!(
            map_bytes = map_json.len(),
            harvested = self.harvested.len(),
            "Durable state persisted"
        );
        Ok(())
    }

    /// Snapshot metrics over the model and the persisted map file.
    pub fn metrics(&self) -> Result<HarvestMetrics, HarvestError> {
        Ok(HarvestMetrics {
            model: ModelMetrics::from_map(&self.map),
            harvested_items: self.harvested.len(),
            map_file_bytes: self
                .storage
                .file_size(&self.config.storage.map_path)
                .map_err(storage_err)?,
        })
    }

    // -------------------------------------------------------------------------
    // The cycle
    // -------------------------------------------------------------------------

    /// Run one harvest cycle.
    ///
    /// Allowed from `Idle` or `Error`; any other state yields
    /// [`HarvestError::CycleInProgress`]. Whatever progress a failing cycle
    /// committed is persisted before the error is returned.
    pub async fn run_cycle<D, F>(
        &mut self,
        discovery: &D,
        fetcher: &F,
    ) -> Result<CycleReport, HarvestError>
    where
        D: Discovery,
        F: SnippetFetcher,
    {
        if !matches!(self.state, HarvestState::Idle | HarvestState::Error) {
            return Err(HarvestError::CycleInProgress { state: self.state });
        }
        self.state = HarvestState::Harvesting;

        let mut report = CycleReport::new(self.config.harvest.quota_ceiling());
        let harvest_outcome = self.harvest_items(discovery, fetcher, &mut report).await;

        self.state = HarvestState::Persisting;
        let persist_outcome = self.persist();

        match harvest_outcome.and(persist_outcome) {
            Ok(()) => {
                self.state = HarvestState::Idle;
                info!(
                    harvested = report.harvested_items,
                    snippets = report.snippets_fetched,
                    skipped = report.skipped_failures,
                    stopped_at_quota = report.stopped_at_quota,
                    "Cycle complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = HarvestState::Error;
                Err(e)
            }
        }
    }

    async fn harvest_items<D, F>(
        &mut self,
        discovery: &D,
        fetcher: &F,
        report: &mut CycleReport,
    ) -> Result<(), HarvestError>
    where
        D: Discovery,
        F: SnippetFetcher,
    {
        let timeout = self.config.harvest.request_timeout();
        let max_items = self.config.harvest.max_items_per_cycle;

        let candidates = tokio::time::timeout(timeout, discovery.list_trending())
            .await
            .map_err(|_| HarvestError::Timeout {
                operation: "list_trending",
            })??;
        report.candidates = candidates.len();

        let per_item_cap = self.config.harvest.per_item_snippet_cap;
        for video in candidates {
            if report.new_items == max_items {
                break;
            }
            if self.harvested.contains(&video) {
                debug!(video = %video, "Already harvested, skipping");
                continue;
            }

            // Predicted check: stop BEFORE a fetch that could breach the
            // ceiling, since a fetch may return up to the per-item cap.
            if report.snippets_fetched.saturating_add(per_item_cap) > report.quota_ceiling {
                report.stopped_at_quota = true;
                warn!(
                    fetched = report.snippets_fetched,
                    ceiling = report.quota_ceiling,
                    "Quota ceiling reached, stopping cycle early"
                );
                break;
            }
            report.new_items += 1;

            let fetched = tokio::time::timeout(timeout, fetcher.fetch_snippets(&video, per_item_cap))
                .await
                .map_err(|_| HarvestError::Timeout {
                    operation: "fetch_snippets",
                })
                .and_then(|outcome| outcome);

            let snippets = match fetched {
                Ok(snippets) => snippets,
                Err(e) => match self.config.harvest.on_fetch_error {
                    FetchFailurePolicy::AbortCycle => return Err(e),
                    FetchFailurePolicy::SkipItem => {
                        warn!(video = %video, error = %e, "Fetch failed, skipping item");
                        report.skipped_failures += 1;
                        continue;
                    }
                },
            };

            for text in &snippets {
                self.map.update(text);
                let record = CorpusRecord::new(video.clone(), text.clone());
                let line = record_to_line(&record)?;
                self.storage
                    .append_line(&self.config.storage.corpus_log_path, &line)
                    .map_err(storage_err)?;
            }

            report.snippets_fetched += snippets.len() as u64;
            self.harvested.insert(video);
            report.harvested_items += 1;
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use std::path::Path;

    struct FixedDiscovery(Vec<&'static str>);

    impl Discovery for FixedDiscovery {
        async fn list_trending(&self) -> Result<Vec<VideoId>, HarvestError> {
            Ok(self.0.iter().copied().map(VideoId::new).collect())
        }
    }

    struct EchoFetcher;

    impl SnippetFetcher for EchoFetcher {
        async fn fetch_snippets(
            &self,
            video: &VideoId,
            _max_snippets: u64,
        ) -> Result<Vec<String>, HarvestError> {
            Ok(vec![format!("comment about {}", video.as_str())])
        }
    }

    fn test_config(dir: &Path) -> QuipConfig {
        let mut config = QuipConfig::default();
        config.storage.map_path = dir.join("map.json");
        config.storage.ids_path = dir.join("harvested.json");
        config.storage.corpus_log_path = dir.join("corpus.jsonl");
        config
    }

    #[tokio::test]
    async fn cycle_rejected_while_busy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut harvester =
            Harvester::new(test_config(dir.path()), FsStorage).expect("harvester");
        harvester.state = HarvestState::Loading;

        let result = harvester
            .run_cycle(&FixedDiscovery(vec!["v1"]), &EchoFetcher)
            .await;

        assert!(matches!(
            result,
            Err(HarvestError::CycleInProgress {
                state: HarvestState::Loading
            })
        ));
    }

    #[tokio::test]
    async fn cycle_allowed_from_error_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut harvester =
            Harvester::new(test_config(dir.path()), FsStorage).expect("harvester");
        harvester.state = HarvestState::Error;

        let report = harvester
            .run_cycle(&FixedDiscovery(vec!["v1"]), &EchoFetcher)
            .await
            .expect("cycle");

        assert_eq!(report.harvested_items, 1);
        assert_eq!(harvester.state(), HarvestState::Idle);
    }

    #[tokio::test]
    async fn quota_ceiling_stops_cycle_before_breach() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config(dir.path());
        // Ceiling of 2 snippets with a per-item cap of 2: after the first
        // item (one snippet fetched) the next fetch could reach 3, so the
        // cycle stops there.
        config.harvest.cost_per_fetch_call = 1;
        config.harvest.daily_call_budget = 2;
        config.harvest.snippets_per_fetch_call = 1;
        config.harvest.per_item_snippet_cap = 2;

        let mut harvester = Harvester::new(config, FsStorage).expect("harvester");
        let report = harvester
            .run_cycle(&FixedDiscovery(vec!["v1", "v2", "v3"]), &EchoFetcher)
            .await
            .expect("cycle");

        assert_eq!(report.harvested_items, 1);
        assert!(report.stopped_at_quota);
        assert_eq!(harvester.state(), HarvestState::Idle);
    }

    #[tokio::test]
    async fn cycle_skips_already_harvested_items() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut harvester =
            Harvester::new(test_config(dir.path()), FsStorage).expect("harvester");
        harvester.harvested.insert(VideoId::new("v1"));

        let report = harvester
            .run_cycle(&FixedDiscovery(vec!["v1", "v2"]), &EchoFetcher)
            .await
            .expect("cycle");

        assert_eq!(report.candidates, 2);
        assert_eq!(report.new_items, 1);
        assert_eq!(report.harvested_items, 1);
    }
}

//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::QuipConfig;
use crate::harvester::{HarvestError, Harvester};
use crate::storage::FsStorage;
use crate::youtube::YouTubeClient;
use quip_core::Generator;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Create a harvester over the local filesystem and load durable state.
fn load_harvester(config: QuipConfig) -> Result<Harvester<FsStorage>, HarvestError> {
    let mut harvester = Harvester::new(config, FsStorage)?;
    harvester.initialise()?;
    Ok(harvester)
}

// =============================================================================
// HARVEST COMMAND
// =============================================================================

/// Run harvest cycles against the configured API.
pub async fn cmd_harvest(
    config: QuipConfig,
    json_mode: bool,
    cycles: u32,
) -> Result<(), HarvestError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        HarvestError::Config(
            "No API key configured; set `api_key` in the config file or QUIP_API_KEY".to_owned(),
        )
    })?;

    let client = YouTubeClient::new(api_key, config.harvest.request_timeout())?;
    let mut harvester = load_harvester(config)?;

    for cycle in 1..=cycles {
        tracing::info!(cycle, cycles, "Starting harvest cycle");
        let report = harvester.run_cycle(&client, &client).await?;

        if json_mode {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        } else {
            println!("Cycle {}/{}", cycle, cycles);
            println!("  Candidates:   {}", report.candidates);
            println!("  New items:    {}", report.new_items);
            println!("  Harvested:    {}", report.harvested_items);
            println!("  Snippets:     {}", report.snippets_fetched);
            println!("  Skipped:      {}", report.skipped_failures);
            if report.stopped_at_quota {
                println!(
                    "  Stopped at quota ceiling ({} snippets/day)",
                    report.quota_ceiling
                );
            }
        }
    }

    Ok(())
}

// =============================================================================
// GENERATE COMMAND
// =============================================================================

/// Generate text from the learned model.
pub fn cmd_generate(
    config: QuipConfig,
    json_mode: bool,
    count: usize,
    seed: Option<u64>,
) -> Result<(), HarvestError> {
    let max_steps = config.max_generation_steps;
    let harvester = load_harvester(config)?;

    if harvester.map().is_empty() {
        return Err(HarvestError::Config(
            "The model is empty; run `quip harvest` first".to_owned(),
        ));
    }

    let generator = Generator::new(max_steps);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut texts = Vec::with_capacity(count);
    for _ in 0..count {
        texts.push(generator.generate(harvester.map(), &mut rng)?);
    }

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&texts).unwrap_or_default()
        );
    } else {
        for text in texts {
            println!("{text}");
        }
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show model and harvest status.
pub fn cmd_status(config: QuipConfig, json_mode: bool) -> Result<(), HarvestError> {
    let map_path = config.storage.map_path.clone();
    let harvester = load_harvester(config)?;
    let metrics = harvester.metrics()?;

    if json_mode {
        let output = serde_json::json!({
            "map_path": map_path.to_string_lossy(),
            "state": harvester.state(),
            "chain_len": harvester.map().chain_len(),
            "keys": metrics.model.key_count,
            "successors": metrics.model.successor_count,
            "branching_per_thousand": metrics.model.branching_per_thousand,
            "completed_sequences": metrics.model.completed_sequences,
            "harvested_items": metrics.harvested_items,
            "map_file_bytes": metrics.map_file_bytes
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Quip Model Status");
    println!("=================");
    println!("Map file:  {:?}", map_path);
    println!("State:     {}", harvester.state());
    println!();
    println!("Chain length:  {}", harvester.map().chain_len());
    println!("Keys:          {}", metrics.model.key_count);
    println!("Successors:    {}", metrics.model.successor_count);
    println!(
        "Branching:     {} per thousand",
        metrics.model.branching_per_thousand
    );
    println!("Completed:     {}", metrics.model.completed_sequences);
    println!("Harvested:     {} items", metrics.harvested_items);
    println!("Map size:      {} bytes", metrics.map_file_bytes);

    Ok(())
}

// =============================================================================
// REBUILD COMMAND
// =============================================================================

/// Rebuild the transition map from the raw corpus log.
pub fn cmd_rebuild(config: QuipConfig, json_mode: bool) -> Result<(), HarvestError> {
    let mut harvester = load_harvester(config)?;
    harvester.rebuild()?;
    let metrics = harvester.metrics()?;

    if json_mode {
        let output = serde_json::json!({
            "keys": metrics.model.key_count,
            "successors": metrics.model.successor_count,
            "harvested_items": metrics.harvested_items
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("Map rebuilt from corpus log");
        println!("  Keys:       {}", metrics.model.key_count);
        println!("  Successors: {}", metrics.model.successor_count);
        println!("  Harvested:  {} items", metrics.harvested_items);
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize empty durable state files.
pub fn cmd_init(config: QuipConfig, force: bool) -> Result<(), HarvestError> {
    let map_path = config.storage.map_path.clone();

    if map_path.exists() && !force {
        return Err(HarvestError::Config(format!(
            "State file {:?} already exists; use --force to overwrite",
            map_path
        )));
    }

    let mut harvester = Harvester::new(config, FsStorage)?;
    harvester.persist()?;

    println!("Initialized empty model at {:?}", map_path);
    Ok(())
}

//! # Quip CLI Module
//!
//! This module implements the CLI interface for Quip.
//!
//! ## Available Commands
//!
//! - `harvest` - Run fetch/update/persist cycles against the API
//! - `generate` - Generate text from the learned model
//! - `status` - Show model and harvest status
//! - `rebuild` - Rebuild the map from the raw corpus log
//! - `init` - Initialize empty durable state files

mod commands;

use crate::config::QuipConfig;
use crate::harvester::HarvestError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Quip - Comment Mimic
///
/// Learns token transitions from harvested video comments and generates
/// new comment-like text from the learned model.
#[derive(Parser, Debug)]
#[command(name = "quip")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run harvest cycles against the configured API
    Harvest {
        /// Number of cycles to run
        #[arg(short = 'n', long, default_value = "1")]
        cycles: u32,
    },

    /// Generate text from the learned model
    Generate {
        /// Number of texts to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// RNG seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Show model and harvest status
    Status,

    /// Rebuild the transition map from the raw corpus log
    Rebuild,

    /// Initialize empty durable state files
    Init {
        /// Force initialization even if state files exist
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HarvestError> {
    let config = QuipConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Harvest { cycles }) => cmd_harvest(config, json_mode, cycles).await,
        Some(Commands::Generate { count, seed }) => cmd_generate(config, json_mode, count, seed),
        Some(Commands::Status) => cmd_status(config, json_mode),
        Some(Commands::Rebuild) => cmd_rebuild(config, json_mode),
        Some(Commands::Init { force }) => cmd_init(config, force),
        None => {
            // No subcommand - show status by default
            cmd_status(config, json_mode)
        }
    }
}

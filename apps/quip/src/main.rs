//! # Quip - Comment Mimic
//!
//! The main binary for the Quip token-transition text generator.
//!
//! This application provides:
//! - Quota-aware harvest cycles over the YouTube Data API
//! - Text generation from the learned transition model
//! - Rebuild and status tooling over the durable state files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  apps/quip (THE BINARY)                 │
//! │                                                         │
//! │  ┌──────────┐   ┌────────────┐   ┌──────────────────┐  │
//! │  │   CLI    │   │ Harvester  │   │ YouTube client   │  │
//! │  │  (clap)  │   │ (cycles)   │   │ (reqwest)        │  │
//! │  └────┬─────┘   └─────┬──────┘   └────────┬─────────┘  │
//! │       │               │                   │            │
//! │       └───────────────┼───────────────────┘            │
//! │                       ▼                                │
//! │               ┌───────────────┐                        │
//! │               │   quip-core   │                        │
//! │               │  (THE MODEL)  │                        │
//! │               └───────────────┘                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run one harvest cycle
//! QUIP_API_KEY=... quip harvest
//!
//! # Generate three comments, reproducibly
//! quip generate -n 3 --seed 42
//!
//! # Model status
//! quip status
//! ```

use clap::Parser;
use quip::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — QUIP_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("QUIP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quip=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Quip startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗ ██╗   ██╗██╗██████╗
  ██╔═══██╗██║   ██║██║██╔══██╗
  ██║   ██║██║   ██║██║██████╔╝
  ██║▄▄ ██║██║   ██║██║██╔═══╝
  ╚██████╔╝╚██████╔╝██║██║
   ╚══▀▀═╝  ╚═════╝ ╚═╝╚═╝

  Comment Mimic v{}

  Deterministic • Quota-Aware • Restartable
"#,
        env!("CARGO_PKG_VERSION")
    );
}

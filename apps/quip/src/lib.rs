//! # Quip Application Library
//!
//! Orchestration and I/O layers for the Quip binary: configuration,
//! storage adapter, harvest orchestrator and the YouTube collaborators.
//!
//! The pure transition model lives in `quip-core`; this crate owns every
//! suspension point (collaborator calls) and every byte written to disk.

pub mod cli;
pub mod config;
pub mod harvester;
pub mod storage;
pub mod youtube;

//! # quip-core
//!
//! The token-transition model for Quip - THE MODEL.
//!
//! This crate implements the statistical core of a comment-mimicking text
//! generator: tokenization into sentence-like units, a Markov transition
//! map over fixed-width token windows, a bounded weighted random walk for
//! generation, and the canonical persistence formats for durable state.
//!
//! ## Architectural Constraints
//!
//! The MODEL:
//! - Owns all statistics; it is the only place token transitions exist
//! - Is deterministic: `BTreeMap` everywhere, no floats, and the only
//!   randomness is the RNG injected into the generator
//! - Does no I/O: files and the network are app-layer concerns
//! - Never panics; all errors are recoverable `QuipError`s

// =============================================================================
// MODULES
// =============================================================================

pub mod chain;
pub mod formats;
pub mod generator;
pub mod harvested;
pub mod metrics;
pub mod primitives;
pub mod tokenizer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ChainKey, QuipError, Token, VideoId};

// =============================================================================
// RE-EXPORTS: Model
// =============================================================================

pub use chain::TransitionMap;
pub use generator::Generator;
pub use harvested::HarvestedSet;
pub use metrics::ModelMetrics;
pub use tokenizer::{TokenSequences, token_sequences};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    CorpusRecord, LoadedMap, harvested_from_json, harvested_to_json, map_from_json, map_to_json,
    record_from_line, record_to_line,
};

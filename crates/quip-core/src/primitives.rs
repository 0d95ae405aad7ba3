//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Quip model.
//!
//! Quip starts with zero data but fixed logic. These primitives are compiled
//! into the binary and are immutable at runtime; the tunable counterparts
//! live in the app-layer configuration.

/// Default chain length K: the number of preceding tokens forming a lookup key.
///
/// K = 2 is the smallest window that captures local word order in short
/// comment-style snippets without starving the map of repeated keys.
pub const DEFAULT_CHAIN_LEN: usize = 2;

/// Default hard cap on generation steps.
///
/// All walks must be computationally bounded. This prevents unbounded output
/// when a cycle in the map never reaches an END token.
pub const DEFAULT_MAX_GENERATION_STEPS: usize = 200;

/// Current persisted-map format version.
///
/// Increment this when making breaking changes to the map document layout.
/// The legacy combined document (map + harvested IDs in one file) predates
/// versioning and is detected by shape instead.
pub const FORMAT_VERSION: u32 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size in bytes for a persisted map document.
///
/// Validated BEFORE deserialization to prevent memory exhaustion from
/// corrupted or malicious files.
pub const MAX_MAP_DOCUMENT_SIZE: usize = 100 * 1024 * 1024;

//! # Model Metrics
//!
//! Derived, read-only statistics of a transition map.
//!
//! The branching factor (average successor-list length) is stored as an
//! integer per-thousand value; an empty map yields 0 rather than an
//! undefined ratio.

use crate::chain::TransitionMap;
use serde::{Deserialize, Serialize};

/// Metrics extracted from a transition map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Number of distinct chain keys.
    pub key_count: usize,
    /// Total recorded successors across all keys.
    pub successor_count: usize,
    /// Average successor-list length, fixed-point: average * 1000.
    /// 0 for an empty map.
    pub branching_per_thousand: u64,
    /// Number of completed learned sequences (END tokens across all
    /// successor lists).
    pub completed_sequences: usize,
}

impl ModelMetrics {
    /// Create metrics with all zeros.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            key_count: 0,
            successor_count: 0,
            branching_per_thousand: 0,
            completed_sequences: 0,
        }
    }

    /// Compute metrics from a transition map.
    #[must_use]
    pub fn from_map(map: &TransitionMap) -> Self {
        let key_count = map.key_count();
        let successor_count = map.successor_count();

        let branching_per_thousand = if key_count == 0 {
            0
        } else {
            (successor_count as u64).saturating_mul(1000) / key_count as u64
        };

        Self {
            key_count,
            successor_count,
            branching_per_thousand,
            completed_sequences: map.end_token_count(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_yields_zero_sentinel() {
        let map = TransitionMap::new(2).expect("map");
        let metrics = ModelMetrics::from_map(&map);

        assert_eq!(metrics, ModelMetrics::empty());
    }

    #[test]
    fn branching_factor_is_fixed_point() {
        // "a b\na c" with K = 1: (Start)->[a,a], (a)->[b,c], (b)->[End],
        // (c)->[End] — 6 successors over 4 keys = 1.5 average.
        let map = TransitionMap::build("a b\na c", 1).expect("build");
        let metrics = ModelMetrics::from_map(&map);

        assert_eq!(metrics.key_count, 4);
        assert_eq!(metrics.successor_count, 6);
        assert_eq!(metrics.branching_per_thousand, 1500);
        assert_eq!(metrics.completed_sequences, 2);
    }
}

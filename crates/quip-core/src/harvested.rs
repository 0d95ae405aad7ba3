//! # Harvested Set Module
//!
//! The set of video identifiers already processed by the harvester.
//!
//! Uniqueness invariant: no identifier is processed twice. Backed by a
//! `BTreeSet`, so the persisted snapshot is canonically sorted and diffs
//! cleanly between cycles.

use crate::types::VideoId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of item identifiers that have already been harvested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarvestedSet(BTreeSet<VideoId>);

impl HarvestedSet {
    /// Create a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an identifier was already harvested.
    #[must_use]
    pub fn contains(&self, id: &VideoId) -> bool {
        self.0.contains(id)
    }

    /// Mark an identifier as harvested.
    ///
    /// Returns `false` if it was already present.
    pub fn insert(&mut self, id: VideoId) -> bool {
        self.0.insert(id)
    }

    /// Number of harvested identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether no identifiers have been harvested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &VideoId> {
        self.0.iter()
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: HarvestedSet) {
        self.0.extend(other.0);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates() {
        let mut set = HarvestedSet::new();

        assert!(set.insert(VideoId::new("abc")));
        assert!(!set.insert(VideoId::new("abc")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serialization_is_sorted() {
        let mut set = HarvestedSet::new();
        set.insert(VideoId::new("zz"));
        set.insert(VideoId::new("aa"));
        set.insert(VideoId::new("mm"));

        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"["aa","mm","zz"]"#);
    }

    #[test]
    fn merge_unions_identifiers() {
        let mut a = HarvestedSet::new();
        a.insert(VideoId::new("one"));

        let mut b = HarvestedSet::new();
        b.insert(VideoId::new("one"));
        b.insert(VideoId::new("two"));

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(&VideoId::new("two")));
    }
}

//! # Persistence Format
//!
//! JSON document layouts for the transition map, the harvested-ID index and
//! the raw corpus log.
//!
//! Two map layouts are supported:
//! - **Split layout** (current): the map document `{version, chain_len,
//!   chains}`, the harvested-ID index as a sorted JSON array in its own
//!   file, and the corpus log as JSON lines.
//! - **Legacy layout**: a single document `{chains, harvested}` combining
//!   the map and the ID list. Read transparently; the caller re-persists in
//!   the split layout.
//!
//! Chain keys appear as JSON object keys in their canonical structural
//! encoding (`ChainKey::canonical`), so a token containing any particular
//! character can never collide with another key.
//!
//! ## Security
//!
//! Document size is validated BEFORE deserialization to prevent memory
//! exhaustion from corrupted or malicious files.

use crate::chain::TransitionMap;
use crate::harvested::HarvestedSet;
use crate::primitives::{FORMAT_VERSION, MAX_MAP_DOCUMENT_SIZE};
use crate::types::{ChainKey, QuipError, Token, VideoId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENT LAYOUTS
// =============================================================================

/// Split-layout map document.
#[derive(Debug, Serialize, Deserialize)]
struct MapDocument {
    version: u32,
    chain_len: usize,
    chains: BTreeMap<String, Vec<Token>>,
}

/// Legacy combined document: map and harvested IDs in one file.
///
/// Predates versioning; detected by the presence of the `harvested` field.
#[derive(Debug, Deserialize)]
struct LegacyDocument {
    chains: BTreeMap<String, Vec<Token>>,
    harvested: HarvestedSet,
}

/// Result of reading a map file in either layout.
#[derive(Debug)]
pub struct LoadedMap {
    /// The reconstructed transition map.
    pub map: TransitionMap,
    /// Harvested IDs embedded in a legacy document, if that layout was read.
    pub legacy_harvested: Option<HarvestedSet>,
}

// =============================================================================
// TRANSITION MAP
// =============================================================================

/// Serialize a transition map to the split-layout JSON document.
pub fn map_to_json(map: &TransitionMap) -> Result<String, QuipError> {
    let mut chains = BTreeMap::new();
    for (key, successors) in map.iter() {
        chains.insert(key.canonical()?, successors.to_vec());
    }

    let document = MapDocument {
        version: FORMAT_VERSION,
        chain_len: map.chain_len(),
        chains,
    };

    serde_json::to_string(&document).map_err(|e| QuipError::SerializationError(e.to_string()))
}

/// Deserialize a transition map from either layout.
///
/// `fallback_chain_len` is used only for a legacy document with no chains,
/// where the chain length cannot be inferred from key lengths.
pub fn map_from_json(json: &str, fallback_chain_len: usize) -> Result<LoadedMap, QuipError> {
    if json.len() > MAX_MAP_DOCUMENT_SIZE {
        return Err(QuipError::SerializationError(format!(
            "Map document of {} bytes exceeds maximum allowed {} bytes",
            json.len(),
            MAX_MAP_DOCUMENT_SIZE
        )));
    }

    if let Ok(document) = serde_json::from_str::<MapDocument>(json) {
        if document.version != FORMAT_VERSION {
            return Err(QuipError::SerializationError(format!(
                "Unsupported map format version: {} (expected {})",
                document.version, FORMAT_VERSION
            )));
        }
        let map = decode_chains(document.chains, document.chain_len)?;
        return Ok(LoadedMap {
            map,
            legacy_harvested: None,
        });
    }

    let legacy: LegacyDocument = serde_json::from_str(json).map_err(|e| {
        QuipError::SerializationError(format!("Map document matches no known layout: {e}"))
    })?;

    let chain_len = legacy
        .chains
        .keys()
        .next()
        .map(|key| ChainKey::from_canonical(key).map(|k| k.len()))
        .transpose()?
        .unwrap_or(fallback_chain_len);

    let map = decode_chains(legacy.chains, chain_len)?;
    Ok(LoadedMap {
        map,
        legacy_harvested: Some(legacy.harvested),
    })
}

/// Decode canonical-string keys and validate the map invariants.
fn decode_chains(
    encoded: BTreeMap<String, Vec<Token>>,
    chain_len: usize,
) -> Result<TransitionMap, QuipError> {
    let mut chains = BTreeMap::new();
    for (key, successors) in encoded {
        chains.insert(ChainKey::from_canonical(&key)?, successors);
    }
    TransitionMap::from_parts(chain_len, chains)
}

// =============================================================================
// HARVESTED-ID INDEX
// =============================================================================

/// Serialize the harvested-ID index as a sorted, diffable JSON array.
pub fn harvested_to_json(harvested: &HarvestedSet) -> Result<String, QuipError> {
    serde_json::to_string_pretty(harvested)
        .map_err(|e| QuipError::SerializationError(e.to_string()))
}

/// Deserialize the harvested-ID index.
pub fn harvested_from_json(json: &str) -> Result<HarvestedSet, QuipError> {
    serde_json::from_str(json)
        .map_err(|e| QuipError::SerializationError(format!("Invalid harvested-ID index: {e}")))
}

// =============================================================================
// CORPUS LOG
// =============================================================================

/// One entry of the append-only raw corpus log.
///
/// The log is the single source of truth: both the transition map and the
/// harvested-ID set can be fully rebuilt from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    /// The item this snippet was fetched from.
    pub video_id: VideoId,
    /// The raw snippet text, verbatim.
    pub text: String,
}

impl CorpusRecord {
    /// Create a new corpus record.
    #[must_use]
    pub fn new(video_id: VideoId, text: impl Into<String>) -> Self {
        Self {
            video_id,
            text: text.into(),
        }
    }
}

/// Encode a record as a single JSON line (newlines in the text are escaped).
pub fn record_to_line(record: &CorpusRecord) -> Result<String, QuipError> {
    serde_json::to_string(record).map_err(|e| QuipError::SerializationError(e.to_string()))
}

/// Decode one line of the corpus log.
pub fn record_from_line(line: &str) -> Result<CorpusRecord, QuipError> {
    serde_json::from_str(line)
        .map_err(|e| QuipError::SerializationError(format!("Invalid corpus record: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_document_roundtrips() {
        let map = TransitionMap::build("great video\nso true", 2).expect("build");

        let json = map_to_json(&map).expect("serialize");
        let loaded = map_from_json(&json, 2).expect("deserialize");

        assert_eq!(loaded.map, map);
        assert!(loaded.legacy_harvested.is_none());
    }

    #[test]
    fn legacy_document_supplies_harvested_ids() {
        let key = ChainKey::new(vec![Token::Start, Token::word("hi")])
            .expect("key")
            .canonical()
            .expect("canonical");
        let json = format!(
            r#"{{"chains":{{"{}":["End"]}},"harvested":["vid1","vid2"]}}"#,
            key.replace('"', "\\\"")
        );

        let loaded = map_from_json(&json, 2).expect("deserialize legacy");

        assert_eq!(loaded.map.chain_len(), 2);
        assert_eq!(loaded.map.key_count(), 1);
        let harvested = loaded.legacy_harvested.expect("legacy ids");
        assert_eq!(harvested.len(), 2);
        assert!(harvested.contains(&VideoId::new("vid1")));
    }

    #[test]
    fn empty_legacy_document_uses_fallback_chain_len() {
        let json = r#"{"chains":{},"harvested":[]}"#;

        let loaded = map_from_json(json, 3).expect("deserialize legacy");
        assert_eq!(loaded.map.chain_len(), 3);
        assert!(loaded.map.is_empty());
    }

    #[test]
    fn unknown_layout_rejected() {
        assert!(map_from_json("{}", 2).is_err());
        assert!(map_from_json("not json at all", 2).is_err());
    }

    #[test]
    fn wrong_version_rejected() {
        let json = r#"{"version":99,"chain_len":2,"chains":{}}"#;
        assert!(map_from_json(json, 2).is_err());
    }

    #[test]
    fn harvested_index_roundtrips_sorted() {
        let mut harvested = HarvestedSet::new();
        harvested.insert(VideoId::new("zeta"));
        harvested.insert(VideoId::new("alpha"));

        let json = harvested_to_json(&harvested).expect("serialize");
        let restored = harvested_from_json(&json).expect("deserialize");

        assert_eq!(restored, harvested);
        // Sorted order in the serialized form.
        assert!(json.find("alpha").expect("alpha") < json.find("zeta").expect("zeta"));
    }

    #[test]
    fn corpus_record_survives_embedded_newlines() {
        let record = CorpusRecord::new(VideoId::new("v1"), "line one\nline two");

        let line = record_to_line(&record).expect("encode");
        assert!(!line.contains('\n'));

        let restored = record_from_line(&line).expect("decode");
        assert_eq!(restored, record);
    }

    #[test]
    fn malformed_record_rejected() {
        assert!(record_from_line("{\"video_id\":").is_err());
    }
}

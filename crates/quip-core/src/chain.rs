//! # Transition Map Module
//!
//! The Markov transition map: a mapping from a K-token chain key to the
//! ordered collection of successor tokens observed after that key.
//!
//! - Repeated successors are kept, not deduplicated; list length and
//!   duplicate count encode observed frequency, which drives the uniform
//!   random draw at generation time
//! - Every present key maps to a non-empty successor list
//! - Every key has exactly `chain_len` tokens
//! - `update` is append-only and commutative in aggregate: the final per-key
//!   successor multiset does not depend on the order snippets were processed

use crate::tokenizer::token_sequences;
use crate::types::{ChainKey, QuipError, Token};
use std::collections::BTreeMap;

/// A transition map with a fixed chain length K.
///
/// Created empty, grown in place via [`TransitionMap::update`], and rebuilt
/// wholesale from the raw corpus via [`TransitionMap::rebuild_from_corpus`].
/// Uses `BTreeMap` for deterministic iteration and serialization order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionMap {
    chain_len: usize,
    chains: BTreeMap<ChainKey, Vec<Token>>,
}

impl TransitionMap {
    /// Create an empty map with the given chain length.
    ///
    /// Returns `QuipError::EmptyChainKey` if `chain_len` is zero.
    pub fn new(chain_len: usize) -> Result<Self, QuipError> {
        if chain_len == 0 {
            return Err(QuipError::EmptyChainKey);
        }
        Ok(Self {
            chain_len,
            chains: BTreeMap::new(),
        })
    }

    /// Build a fresh map from a text blob.
    pub fn build(text: &str, chain_len: usize) -> Result<Self, QuipError> {
        let mut map = Self::new(chain_len)?;
        map.update(text);
        Ok(map)
    }

    /// Update the map in place with a text blob.
    ///
    /// For every padded token sequence, a window of width K slides across
    /// the sequence; the key formed by tokens `[i..i+K]` is recorded as
    /// observed followed by token `i+K`.
    pub fn update(&mut self, text: &str) {
        for sequence in token_sequences(text, self.chain_len) {
            for window in sequence.windows(self.chain_len + 1) {
                let key = ChainKey::from_window(&window[..self.chain_len]);
                let successor = window[self.chain_len].clone();
                self.chains.entry(key).or_default().push(successor);
            }
        }
    }

    /// Rebuild a map from the raw corpus, one snippet text at a time.
    ///
    /// Idempotent: rebuilding from the same corpus twice yields maps with
    /// identical key sets and identical per-key successor multisets.
    pub fn rebuild_from_corpus<'a, I>(texts: I, chain_len: usize) -> Result<Self, QuipError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = Self::new(chain_len)?;
        for text in texts {
            map.update(text);
        }
        Ok(map)
    }

    /// Reassemble a map from deserialized parts, validating the invariants.
    ///
    /// Rejects keys whose length differs from `chain_len` and any key with
    /// an empty successor list.
    pub(crate) fn from_parts(
        chain_len: usize,
        chains: BTreeMap<ChainKey, Vec<Token>>,
    ) -> Result<Self, QuipError> {
        if chain_len == 0 {
            return Err(QuipError::EmptyChainKey);
        }
        for (key, successors) in &chains {
            if key.len() != chain_len {
                return Err(QuipError::ChainLengthMismatch {
                    expected: chain_len,
                    found: key.len(),
                });
            }
            if successors.is_empty() {
                return Err(QuipError::SerializationError(format!(
                    "key {:?} has an empty successor list",
                    key
                )));
            }
        }
        Ok(Self { chain_len, chains })
    }

    /// The chain length K of this map.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain_len
    }

    /// Look up the successor collection for a key.
    #[must_use]
    pub fn successors(&self, key: &ChainKey) -> Option<&[Token]> {
        self.chains.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys in the map.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.chains.len()
    }

    /// Total number of recorded successors across all keys.
    #[must_use]
    pub fn successor_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    /// Number of END tokens across all successor lists.
    ///
    /// Each END successor corresponds to one completed learned sequence.
    #[must_use]
    pub fn end_token_count(&self) -> usize {
        self.chains
            .values()
            .flat_map(|successors| successors.iter())
            .filter(|token| **token == Token::End)
            .count()
    }

    /// Check whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Iterate over keys and their successor lists in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChainKey, &[Token])> {
        self.chains
            .iter()
            .map(|(key, successors)| (key, successors.as_slice()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Core Type Definitions
//!
//! This module contains all core types for the Quip transition model:
//! - Atomic text units (`Token`)
//! - Fixed-length lookup keys (`ChainKey`)
//! - External item identifiers (`VideoId`)
//! - Error types (`QuipError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Serialize structurally (no delimiter joining), so a word that happens
//!   to contain a control-marker spelling can never collide with a control
//!   token

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// TOKEN
// =============================================================================

/// Atomic text unit: a word, a punctuation fragment, or a control symbol.
///
/// Control symbols mark the boundaries of a learned sequence. They are
/// structurally distinct variants, so `Token::word("Start")` and
/// `Token::Start` are different values with different serializations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Sentinel marking the beginning of a learned sequence.
    Start,
    /// Sentinel marking the end of a learned sequence.
    End,
    /// A literal word or punctuation fragment, preserved verbatim.
    Word(String),
}

impl Token {
    /// Create a word token from a string.
    #[must_use]
    pub fn word(s: impl Into<String>) -> Self {
        Self::Word(s.into())
    }

    /// Check whether this token is a control symbol (START or END).
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Start | Self::End)
    }

    /// Get the word text, if this is a word token.
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(w),
            Self::Start | Self::End => None,
        }
    }
}

// =============================================================================
// CHAIN KEY
// =============================================================================

/// An ordered, fixed-length tuple of exactly K tokens.
///
/// Every key in a given map has the same length (the map's chain length).
/// Keys are compared and stored structurally; the canonical string form used
/// in persisted JSON is the `serde_json` encoding of the token array, which
/// is deterministic and collision-free.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainKey(Vec<Token>);

impl ChainKey {
    /// Create a key from a token list.
    ///
    /// Returns `QuipError::EmptyChainKey` for an empty list.
    pub fn new(tokens: Vec<Token>) -> Result<Self, QuipError> {
        if tokens.is_empty() {
            return Err(QuipError::EmptyChainKey);
        }
        Ok(Self(tokens))
    }

    /// Create the initial key of K consecutive START tokens.
    pub fn start(chain_len: usize) -> Result<Self, QuipError> {
        Self::new(vec![Token::Start; chain_len])
    }

    /// Build a key from a window slice without re-validating length.
    ///
    /// Callers guarantee the slice is non-empty.
    pub(crate) fn from_window(tokens: &[Token]) -> Self {
        Self(tokens.to_vec())
    }

    /// Number of tokens in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A key is never empty; provided for slice-like completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The tokens forming this key, oldest first.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// Advance the key by one step: drop the oldest token, append `next`.
    #[must_use]
    pub fn advance(&self, next: Token) -> Self {
        let mut tokens = Vec::with_capacity(self.0.len());
        tokens.extend_from_slice(&self.0[1..]);
        tokens.push(next);
        Self(tokens)
    }

    /// Canonical string encoding for use as a JSON object key.
    pub fn canonical(&self) -> Result<String, QuipError> {
        serde_json::to_string(&self.0).map_err(|e| QuipError::SerializationError(e.to_string()))
    }

    /// Parse a key from its canonical string encoding.
    pub fn from_canonical(s: &str) -> Result<Self, QuipError> {
        let tokens: Vec<Token> = serde_json::from_str(s)
            .map_err(|e| QuipError::SerializationError(format!("invalid chain key '{s}': {e}")))?;
        Self::new(tokens)
    }
}

// =============================================================================
// VIDEO ID
// =============================================================================

/// Opaque identifier of an external item whose snippets are harvested.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VideoId(pub String);

impl VideoId {
    /// Create a new video identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Quip model.
///
/// - No silent failures
/// - Use `Result<T, QuipError>` for fallible operations
/// - The model never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum QuipError {
    /// A chain key or chain length of zero tokens was requested.
    #[error("Chain keys must contain at least one token")]
    EmptyChainKey,

    /// A key or map with a different chain length was mixed into this map.
    #[error("Chain length mismatch: expected {expected}, found {found}")]
    ChainLengthMismatch { expected: usize, found: usize },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_tokens_distinct_from_words() {
        assert_ne!(Token::Start, Token::word("Start"));
        assert_ne!(Token::End, Token::word("End"));
        assert!(Token::Start.is_control());
        assert!(!Token::word("Start").is_control());
    }

    #[test]
    fn chain_key_rejects_empty() {
        assert!(ChainKey::new(Vec::new()).is_err());
        assert!(ChainKey::start(0).is_err());
    }

    #[test]
    fn chain_key_advance_keeps_length() {
        let key = ChainKey::start(3).expect("start key");
        let advanced = key.advance(Token::word("hi"));

        assert_eq!(advanced.len(), 3);
        assert_eq!(
            advanced.tokens(),
            &[Token::Start, Token::Start, Token::word("hi")]
        );
    }

    #[test]
    fn canonical_encoding_roundtrips() {
        let key = ChainKey::new(vec![Token::Start, Token::word("a b")]).expect("key");
        let encoded = key.canonical().expect("encode");
        let decoded = ChainKey::from_canonical(&encoded).expect("decode");

        assert_eq!(key, decoded);
    }

    #[test]
    fn canonical_encoding_is_collision_free() {
        // A word containing the serialized control spelling must not collide
        // with the control token itself.
        let control = ChainKey::new(vec![Token::Start]).expect("key");
        let word = ChainKey::new(vec![Token::word("Start")]).expect("key");

        assert_ne!(
            control.canonical().expect("encode"),
            word.canonical().expect("encode")
        );
    }
}

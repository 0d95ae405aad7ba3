//! # Tokenizer Module
//!
//! Splits a raw text blob into sentence-like token sequences.
//!
//! - Units end at sentence-ending punctuation (`.` `!` `?`) or line boundaries
//! - Tokens are whitespace-separated and preserved verbatim (case and
//!   punctuation included; no normalization)
//! - Each unit is wrapped with K leading START tokens and one trailing END,
//!   so the very first real token already has a full-length key
//! - The returned iterator is lazy, finite and restartable (call
//!   [`token_sequences`] again to re-scan the same text)

use crate::types::Token;

/// Characters that terminate a sentence-like unit.
const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];

/// Lazily yield padded token sequences for every sentence-like unit in `text`.
///
/// Empty input, or input consisting only of whitespace and boundaries,
/// yields zero sequences.
#[must_use]
pub fn token_sequences(text: &str, chain_len: usize) -> TokenSequences<'_> {
    TokenSequences {
        remainder: text,
        chain_len,
    }
}

/// Iterator over the padded token sequences of a text blob.
///
/// Produced by [`token_sequences`].
#[derive(Debug, Clone)]
pub struct TokenSequences<'a> {
    remainder: &'a str,
    chain_len: usize,
}

impl<'a> TokenSequences<'a> {
    /// Take the next sentence-like unit off the front of the remainder.
    ///
    /// The terminating punctuation stays attached to its word; the newline
    /// terminator is consumed but never appears in a token.
    fn next_unit(&mut self) -> Option<&'a str> {
        if self.remainder.is_empty() {
            return None;
        }

        let boundary = self
            .remainder
            .char_indices()
            .find(|(_, c)| *c == '\n' || SENTENCE_ENDINGS.contains(c));

        let (unit, rest) = match boundary {
            Some((idx, c)) => {
                let end = idx + c.len_utf8();
                (&self.remainder[..end], &self.remainder[end..])
            }
            None => (self.remainder, ""),
        };

        self.remainder = rest;
        Some(unit)
    }
}

impl Iterator for TokenSequences<'_> {
    type Item = Vec<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let unit = self.next_unit()?;

            let words: Vec<&str> = unit.split_whitespace().collect();
            if words.is_empty() {
                // Blank line or stray boundary; keep scanning.
                continue;
            }

            let mut sequence = Vec::with_capacity(self.chain_len + words.len() + 1);
            sequence.resize(self.chain_len, Token::Start);
            sequence.extend(words.into_iter().map(Token::word));
            sequence.push(Token::End);

            return Some(sequence);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn words(sequence: &[Token]) -> Vec<&str> {
        sequence.iter().filter_map(Token::as_word).collect()
    }

    #[test]
    fn empty_input_yields_no_sequences() {
        assert_eq!(token_sequences("", 2).count(), 0);
        assert_eq!(token_sequences("   \n\n  ", 2).count(), 0);
    }

    #[test]
    fn line_boundaries_split_units() {
        let sequences: Vec<_> = token_sequences("a b c\nb c d", 2).collect();

        assert_eq!(sequences.len(), 2);
        assert_eq!(words(&sequences[0]), vec!["a", "b", "c"]);
        assert_eq!(words(&sequences[1]), vec!["b", "c", "d"]);
    }

    #[test]
    fn sentence_punctuation_splits_units() {
        let sequences: Vec<_> = token_sequences("so good. totally agree!", 1).collect();

        assert_eq!(sequences.len(), 2);
        assert_eq!(words(&sequences[0]), vec!["so", "good."]);
        assert_eq!(words(&sequences[1]), vec!["totally", "agree!"]);
    }

    #[test]
    fn units_are_padded_with_control_tokens() {
        let sequences: Vec<_> = token_sequences("hey", 3).collect();

        assert_eq!(
            sequences[0],
            vec![
                Token::Start,
                Token::Start,
                Token::Start,
                Token::word("hey"),
                Token::End
            ]
        );
    }

    #[test]
    fn tokens_are_preserved_verbatim() {
        let sequences: Vec<_> = token_sequences("OMG :3 sooo, GOOD", 1).collect();

        assert_eq!(words(&sequences[0]), vec!["OMG", ":3", "sooo,", "GOOD"]);
    }

    #[test]
    fn iterator_is_restartable() {
        let text = "first one. second one.";
        let first_pass: Vec<_> = token_sequences(text, 2).collect();
        let second_pass: Vec<_> = token_sequences(text, 2).collect();

        assert_eq!(first_pass, second_pass);
    }
}

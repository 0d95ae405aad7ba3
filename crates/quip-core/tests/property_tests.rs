//! # Property-Based Tests
//!
//! Verification of the transition-map invariants with proptest.
//!
//! These tests ensure determinism and the structural invariants every map
//! must uphold regardless of input.

use proptest::prelude::*;
use quip_core::{ChainKey, Generator, Token, TransitionMap, map_from_json, map_to_json};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;

/// Strategy for snippet-like text: lowercase words, sentence punctuation
/// and line boundaries.
fn snippet() -> impl Strategy<Value = String> {
    "[a-z .!?\n]{0,60}"
}

proptest! {
    /// Every key in a chain-length-K map has exactly K tokens, and every
    /// successor list is non-empty.
    #[test]
    fn structural_invariants_hold(text in snippet(), chain_len in 1usize..5) {
        let map = TransitionMap::build(&text, chain_len).expect("build");

        for (key, successors) in map.iter() {
            prop_assert_eq!(key.len(), chain_len);
            prop_assert!(!successors.is_empty());
        }
    }

    /// Rebuilding from the same corpus twice produces identical key sets
    /// and identical per-key successor multisets.
    #[test]
    fn rebuild_is_idempotent(
        corpus in prop::collection::vec(snippet(), 0..8),
        chain_len in 1usize..4
    ) {
        let texts: Vec<&str> = corpus.iter().map(String::as_str).collect();

        let once = TransitionMap::rebuild_from_corpus(texts.iter().copied(), chain_len)
            .expect("rebuild");
        let twice = TransitionMap::rebuild_from_corpus(texts.iter().copied(), chain_len)
            .expect("rebuild");

        prop_assert_eq!(once, twice);
    }

    /// The aggregate effect of updates is order-independent: per-key
    /// successor multisets only depend on the union of processed text.
    #[test]
    fn update_order_does_not_matter(
        first in snippet(),
        second in snippet(),
        chain_len in 1usize..4
    ) {
        let mut forward = TransitionMap::new(chain_len).expect("map");
        forward.update(&first);
        forward.update(&second);

        let mut reverse = TransitionMap::new(chain_len).expect("map");
        reverse.update(&second);
        reverse.update(&first);

        prop_assert_eq!(forward.key_count(), reverse.key_count());
        for (key, successors) in forward.iter() {
            let mut lhs = successors.to_vec();
            let mut rhs = reverse.successors(key).expect("key present").to_vec();
            lhs.sort();
            rhs.sort();
            prop_assert_eq!(lhs, rhs);
        }
    }

    /// Generation never emits a token absent from the corpus, and every
    /// emitted step follows a recorded transition.
    #[test]
    fn generation_stays_inside_the_corpus(
        text in snippet(),
        chain_len in 1usize..4,
        seed in any::<u64>()
    ) {
        let map = TransitionMap::build(&text, chain_len).expect("build");
        let vocabulary: BTreeSet<&str> = text.split_whitespace().collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let output = Generator::default().generate(&map, &mut rng).expect("generate");

        let mut key = ChainKey::start(chain_len).expect("start key");
        for word in output.split_whitespace() {
            prop_assert!(vocabulary.contains(word));

            let token = Token::word(word);
            let successors = map.successors(&key).expect("walk key");
            prop_assert!(successors.contains(&token));
            key = key.advance(token);
        }
    }

    /// The persisted JSON document reconstructs the exact same map.
    #[test]
    fn persisted_map_reconstructs_exactly(text in snippet(), chain_len in 1usize..4) {
        let map = TransitionMap::build(&text, chain_len).expect("build");

        let json = map_to_json(&map).expect("serialize");
        let loaded = map_from_json(&json, chain_len).expect("deserialize");

        prop_assert_eq!(loaded.map, map);
    }
}

// tests/env_roundtrip.rs

//! Property tests for the env-var edit-list ⇄ persisted-mapping conversion.

use std::collections::BTreeMap;

use proptest::prelude::*;

use taskhelm::editor::{EnvPair, env_map_to_pairs, env_pairs_to_map};

fn non_blank_key() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,11}"
}

fn any_value() -> impl Strategy<Value = String> {
    "[ -~]{0,12}"
}

proptest! {
    /// With all-non-blank keys, list→map→list reproduces the same key/value
    /// set (order-insensitive, later duplicates winning).
    #[test]
    fn non_blank_pairs_survive_the_round_trip(
        raw in proptest::collection::vec((non_blank_key(), any_value()), 0..16)
    ) {
        let pairs: Vec<EnvPair> = raw
            .iter()
            .map(|(key, value)| EnvPair { key: key.clone(), value: value.clone() })
            .collect();

        let mut expected = BTreeMap::new();
        for (key, value) in &raw {
            expected.insert(key.clone(), value.clone());
        }

        let map = env_pairs_to_map(&pairs);
        prop_assert_eq!(&map, &expected);

        let relisted = env_map_to_pairs(&map);
        prop_assert_eq!(env_pairs_to_map(&relisted), map);
    }

    /// Blank/whitespace keys are dropped, and the drop is idempotent: a
    /// second pass over the relisted pairs changes nothing.
    #[test]
    fn blank_keys_drop_idempotently(
        raw in proptest::collection::vec(("[ \\t]{0,3}|[A-Za-z]{1,6}", any_value()), 0..16)
    ) {
        let pairs: Vec<EnvPair> = raw
            .into_iter()
            .map(|(key, value)| EnvPair { key, value })
            .collect();

        let once = env_pairs_to_map(&pairs);
        for key in once.keys() {
            prop_assert!(!key.trim().is_empty());
        }

        let twice = env_pairs_to_map(&env_map_to_pairs(&once));
        prop_assert_eq!(twice, once);
    }
}

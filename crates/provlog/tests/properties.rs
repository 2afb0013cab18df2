//! Property tests over ledger-built chains.

use proptest::prelude::*;
use provlog::core::hash_bytes;
use provlog::{verify_linkage, FailureKind, KeyPair, Ledger, MemoryStore, Metadata};
use provlog_testkit::generators;

fn build(metadata: Vec<Metadata>) -> Vec<provlog::ChainEntry> {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store, KeyPair::from_seed(&[7; 32]));
    metadata
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            ledger
                .record_entry(&hash_bytes(&i.to_le_bytes()), &format!("/f/{}.bin", i), m)
                .unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_appends_are_contiguous(metadata in prop::collection::vec(generators::metadata(), 1..8)) {
        let n = metadata.len() as u64;
        let entries = build(metadata);

        let indices: Vec<u64> = entries.iter().map(|e| e.index).collect();
        prop_assert_eq!(indices, (0..n).collect::<Vec<_>>());
        prop_assert!(verify_linkage(&entries).is_empty());
    }

    #[test]
    fn prop_flipped_hash_breaks_only_next_link(
        metadata in prop::collection::vec(generators::metadata(), 2..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut entries = build(metadata);
        let target = pick.index(entries.len() - 1);
        entries[target].entry_hash = hash_bytes(b"forged");

        let failures = verify_linkage(&entries);
        prop_assert_eq!(failures.len(), 1);
        prop_assert_eq!(failures[0].entry_index, target as u64 + 1);
        prop_assert_eq!(failures[0].reason, FailureKind::LinkageBroken);
    }
}

//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use provlog_core::{hash_bytes, sign_entry, ChainEntry, KeyPair, Metadata};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = KeyPair> {
    any::<[u8; 32]>().prop_map(|seed| KeyPair::from_seed(&seed))
}

/// Generate a hex SHA-256 digest.
pub fn digest() -> impl Strategy<Value = String> {
    any::<Vec<u8>>().prop_map(|bytes| hash_bytes(&bytes))
}

/// Generate a timestamp in the entry format.
pub fn timestamp() -> impl Strategy<Value = String> {
    (2000u32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1000).prop_map(
        |(y, mo, d, h, mi, s, ms)| {
            format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z", y, mo, d, h, mi, s, ms)
        },
    )
}

/// Generate an artifact reference path.
pub fn artifact_ref() -> impl Strategy<Value = String> {
    "(/[a-z0-9_]{1,12}){1,3}\\.(jpg|png|bin)".prop_map(String::from)
}

/// Generate a JSON scalar. Floats are excluded; their text form is not
/// stable across encoders.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        "\\PC{0,16}".prop_map(Value::from),
    ]
}

/// Generate a nested JSON value up to a few levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_scalar().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map("\\PC{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate an entry metadata object.
pub fn metadata() -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map("[a-zA-Z_ü]{1,10}", json_value(), 0..8)
        .prop_map(|m| m.into_iter().collect())
}

/// Parameters for generating an entry.
#[derive(Debug, Clone)]
pub struct EntryParams {
    pub keypair: KeyPair,
    pub index: u64,
    pub timestamp: String,
    pub artifact_hash: String,
    pub artifact_ref: String,
    pub previous_hash: String,
    pub metadata: Metadata,
}

impl Arbitrary for EntryParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            keypair(),
            0u64..=1_000_000u64,
            timestamp(),
            digest(),
            artifact_ref(),
            digest(),
            metadata(),
        )
            .prop_map(
                |(keypair, index, timestamp, artifact_hash, artifact_ref, previous, metadata)| {
                    EntryParams {
                        keypair,
                        index,
                        timestamp,
                        artifact_hash,
                        artifact_ref,
                        previous_hash: if index == 0 { String::new() } else { previous },
                        metadata,
                    }
                },
            )
            .boxed()
    }
}

/// Generate an entry from parameters.
pub fn entry_from_params(params: &EntryParams) -> ChainEntry {
    sign_entry(
        &params.keypair,
        params.index,
        &params.timestamp,
        &params.artifact_hash,
        &params.artifact_ref,
        &params.previous_hash,
        params.metadata.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use provlog_core::{canonicalize, verify_entry_hash, verify_signature};

    proptest! {
        #[test]
        fn test_signing_deterministic(params: EntryParams) {
            let e1 = entry_from_params(&params);
            let e2 = entry_from_params(&params);

            prop_assert_eq!(e1.canonical_bytes(), e2.canonical_bytes());
            prop_assert_eq!(e1.entry_hash, e2.entry_hash);
        }

        #[test]
        fn test_signed_entries_verify(params: EntryParams) {
            let entry = entry_from_params(&params);
            prop_assert!(verify_signature(&params.keypair.verify_key(), &entry));
            prop_assert!(verify_entry_hash(&entry));
        }

        #[test]
        fn test_canonical_reparse_stable(value in json_value()) {
            let first = canonicalize(&value);
            let reparsed: Value = serde_json::from_slice(&first).unwrap();
            prop_assert_eq!(canonicalize(&reparsed), first);
        }

        #[test]
        fn test_metadata_change_breaks_signature(
            params in any::<EntryParams>(),
            key in "[a-z]{1,6}",
            value in json_scalar(),
        ) {
            let entry = entry_from_params(&params);
            let mut forged = entry.clone();
            forged.metadata.insert(key, value);
            prop_assume!(forged.metadata != entry.metadata);

            prop_assert!(!verify_signature(&params.keypair.verify_key(), &forged));
        }

        #[test]
        fn test_json_roundtrip_keeps_entry_valid(params: EntryParams) {
            let entry = entry_from_params(&params);
            let json = serde_json::to_string(&entry).unwrap();
            let decoded: ChainEntry = serde_json::from_str(&json).unwrap();

            prop_assert!(verify_signature(&params.keypair.verify_key(), &decoded));
            prop_assert!(verify_entry_hash(&decoded));
        }
    }
}

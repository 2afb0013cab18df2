//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical form, the Ed25519 signature, and the entry
//! hash byte for byte. Ed25519 signing is deterministic, so any implementation
//! that signs the same fields with the same seed must reproduce all three.

use provlog_core::{sign_entry, ChainEntry, KeyPair, Metadata};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub seed: [u8; 32],
    pub index: u64,
    pub timestamp: &'static str,
    pub artifact_hash: &'static str,
    pub artifact_ref: &'static str,
    pub previous_hash: &'static str,
    /// Metadata as JSON text, in deliberately unsorted order.
    pub metadata_json: &'static str,
    /// Expected canonical text of the signed fields.
    pub expected_canonical: &'static str,
    /// Expected hex signature over the canonical text.
    pub expected_signature: &'static str,
    /// Expected hex SHA-256 of the canonical text followed by the signature hex.
    pub expected_entry_hash: &'static str,
}

/// SHA-256 of `"abc"`.
const HASH_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
/// SHA-256 of the empty string.
const HASH_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
/// SHA-256 of `"test"`, standing in for a predecessor's entry hash.
const HASH_TEST: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis with camera metadata",
            seed: [0x42; 32],
            index: 0,
            timestamp: "2025-01-14T12:00:00.000Z",
            artifact_hash: HASH_ABC,
            artifact_ref: "/data/frames/frame_0000.jpg",
            previous_hash: "",
            metadata_json: r#"{"frame_filename":"frame_0000.jpg","camera":{"resolution":[1920,1080],"device":"/dev/video0"}}"#,
            expected_canonical: concat!(
                r#"{"artifact_hash":"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad","#,
                r#""artifact_ref":"/data/frames/frame_0000.jpg","index":0,"#,
                r#""metadata":{"camera":{"device":"/dev/video0","resolution":[1920,1080]},"#,
                r#""frame_filename":"frame_0000.jpg"},"previous_hash":"","#,
                r#""timestamp":"2025-01-14T12:00:00.000Z"}"#
            ),
            expected_signature: concat!(
                "6fb285812d6debc3281650308ab2b2700bfd836adaeeeee03e510773a416ea06",
                "d3afed141780e91b56d043784a3cb10296a830cfa3c96b9c17157b3fec856907"
            ),
            expected_entry_hash: "2641951630270aed605fa5cbd7321c3b0b89c9ee093fabf7817a4514e9071d83",
        },
        GoldenVector {
            name: "linked entry with empty metadata",
            seed: [0x42; 32],
            index: 1,
            timestamp: "2025-01-14T12:00:01.250Z",
            artifact_hash: HASH_EMPTY,
            artifact_ref: "frame_0001.jpg",
            previous_hash: HASH_TEST,
            metadata_json: "{}",
            expected_canonical: concat!(
                r#"{"artifact_hash":"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855","#,
                r#""artifact_ref":"frame_0001.jpg","index":1,"metadata":{},"#,
                r#""previous_hash":"9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08","#,
                r#""timestamp":"2025-01-14T12:00:01.250Z"}"#
            ),
            expected_signature: concat!(
                "e46a27737d7bf68ad40e2fae5b966683e708e6e46e4aa56b5a7736c1461a5b12",
                "d68d87a446f05b6f82993de36033c2d65a8386b5267b6913ea0bb6de8e70dc05"
            ),
            expected_entry_hash: "137f097201be33d53eca3debcf8c6a91bb83d24409e19ff3bf6ee7acdf883ccd",
        },
        GoldenVector {
            name: "non-ASCII keys and escaped text",
            seed: [0x00; 32],
            index: 2,
            timestamp: "2025-01-14T12:00:02.000Z",
            artifact_hash: HASH_ABC,
            artifact_ref: "/frames/ü.jpg",
            previous_hash: HASH_TEST,
            metadata_json: r#"{"note":"Zürich \"north\" gate\n","ünï":true,"Z":null}"#,
            expected_canonical: concat!(
                r#"{"artifact_hash":"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad","#,
                r#""artifact_ref":"/frames/ü.jpg","index":2,"#,
                r#""metadata":{"Z":null,"note":"Zürich \"north\" gate\n","ünï":true},"#,
                r#""previous_hash":"9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08","#,
                r#""timestamp":"2025-01-14T12:00:02.000Z"}"#
            ),
            expected_signature: concat!(
                "300fdff8c670a96669d005ce744b82a6f63324b0d208d99c7681c9556a6063f2",
                "6fc9bf3b6389057487e57d10f99b120e4d289e9b661f7056e25f73fefda0d40f"
            ),
            expected_entry_hash: "e0ff50aee8ba367acdbdd9568d81768f6254ad3d443f247d533822ea135879e2",
        },
    ]
}

/// Sign the entry described by a golden vector.
pub fn generate_entry_from_vector(vector: &GoldenVector) -> ChainEntry {
    let keypair = KeyPair::from_seed(&vector.seed);
    let metadata: Metadata = serde_json::from_str(vector.metadata_json).unwrap_or_default();

    sign_entry(
        &keypair,
        vector.index,
        vector.timestamp,
        vector.artifact_hash,
        vector.artifact_ref,
        vector.previous_hash,
        metadata,
    )
}

/// Check every golden vector against this implementation.
///
/// Returns `(name, matches, canonical_text)` for each vector. A vector
/// matches when its canonical text, signature, and entry hash are exact and
/// the signature and entry hash verify.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let entry = generate_entry_from_vector(v);
            let canonical = String::from_utf8_lossy(&entry.canonical_bytes()).into_owned();
            let key = KeyPair::from_seed(&v.seed).verify_key();

            let matches = canonical == v.expected_canonical
                && entry.signature == v.expected_signature
                && entry.entry_hash == v.expected_entry_hash
                && provlog_core::verify_signature(&key, &entry)
                && provlog_core::verify_entry_hash(&entry);

            (v.name.to_string(), matches, canonical)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use provlog_core::hash_bytes;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, canonical) in verify_all_vectors() {
            assert!(matches, "vector '{}' diverged: {}", name, canonical);
        }
    }

    #[test]
    fn test_vector_hashes_are_real_digests() {
        assert_eq!(hash_bytes(b"abc"), HASH_ABC);
        assert_eq!(hash_bytes(b""), HASH_EMPTY);
        assert_eq!(hash_bytes(b"test"), HASH_TEST);
    }

    #[test]
    fn test_entry_hash_covers_signature_text() {
        for vector in all_vectors() {
            let mut input = vector.expected_canonical.as_bytes().to_vec();
            input.extend_from_slice(vector.expected_signature.as_bytes());
            assert_eq!(hash_bytes(&input), vector.expected_entry_hash, "{}", vector.name);
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let e1 = generate_entry_from_vector(&vector);
            let e2 = generate_entry_from_vector(&vector);
            assert_eq!(
                e1.entry_hash, e2.entry_hash,
                "vector '{}' produced different entry hashes on regeneration",
                vector.name
            );
        }
    }

    #[test]
    fn test_different_seeds_different_signatures() {
        let mut v1 = all_vectors().remove(0);
        let mut v2 = v1.clone();
        v1.seed = [0x01; 32];
        v2.seed = [0x02; 32];

        let e1 = generate_entry_from_vector(&v1);
        let e2 = generate_entry_from_vector(&v2);
        assert_eq!(e1.canonical_bytes(), e2.canonical_bytes());
        assert_ne!(e1.signature, e2.signature);
        assert_ne!(e1.entry_hash, e2.entry_hash);
    }
}

//! # provlog testkit
//!
//! Testing utilities for provlog.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed inputs with their exact canonical text
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A ready chain over a temp directory of artifacts
//!
//! ## Golden Vectors
//!
//! ```rust
//! use provlog_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, _canonical) in verify_all_vectors() {
//!     assert!(matches, "{} diverged", name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use provlog_testkit::generators::{entry_from_params, EntryParams};
//!
//! proptest! {
//!     #[test]
//!     fn entry_hash_is_deterministic(params: EntryParams) {
//!         let e1 = entry_from_params(&params);
//!         let e2 = entry_from_params(&params);
//!         prop_assert_eq!(e1.entry_hash, e2.entry_hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use provlog_testkit::fixtures::TestChain;
//!
//! let chain = TestChain::new();
//! chain.record_frames(3);
//! assert!(chain.verifier().verify_full_chain().unwrap().is_valid());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{metadata, TestChain};
pub use generators::{entry_from_params, EntryParams};
pub use vectors::{all_vectors, generate_entry_from_vector, verify_all_vectors, GoldenVector};

//! The Verifier: read-only integrity checks over a stored chain.
//!
//! Verification has two levels:
//! 1. **Entry checks**: artifact digest, signature, entry hash (first failure
//!    only, in that order)
//! 2. **Linkage checks**: genesis shape, index continuity, and each entry's
//!    `previous_hash` against its predecessor's `entry_hash`
//!
//! Integrity failures never abort a run. They are collected into a
//! [`VerificationReport`]; only storage errors are returned as `Err`.

use std::fmt;
use std::time::{Duration, Instant};

use provlog_core::{verify_entry_hash, verify_signature, ChainEntry, VerifyKey};
use provlog_store::ChainStore;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::artifact::ArtifactResolver;
use crate::error::Result;

/// How many hex characters of a digest to show in failure details.
const DIGEST_PREFIX: usize = 16;

/// Why an entry failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ArtifactMissing,
    ArtifactHashMismatch,
    SignatureInvalid,
    EntryHashMismatch,
    LinkageBroken,
    InvalidGenesis,
}

impl FailureKind {
    /// Whether this failure comes from the linkage pass.
    pub fn is_linkage(&self) -> bool {
        matches!(self, FailureKind::LinkageBroken | FailureKind::InvalidGenesis)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureKind::ArtifactMissing => "artifact not found",
            FailureKind::ArtifactHashMismatch => "artifact hash mismatch",
            FailureKind::SignatureInvalid => "invalid Ed25519 signature",
            FailureKind::EntryHashMismatch => "invalid entry hash",
            FailureKind::LinkageBroken => "broken chain linkage",
            FailureKind::InvalidGenesis => "invalid genesis entry",
        };
        f.write_str(text)
    }
}

/// A single verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub entry_index: u64,
    pub reason: FailureKind,
    pub details: String,
}

impl Failure {
    pub fn new(entry_index: u64, reason: FailureKind, details: impl Into<String>) -> Self {
        Self {
            entry_index,
            reason,
            details: details.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry #{}: {}", self.entry_index, self.reason)?;
        if !self.details.is_empty() {
            write!(f, " ({})", self.details)?;
        }
        Ok(())
    }
}

/// Outcome of verifying a whole chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// Entries loaded from the store.
    pub total_entries: u64,
    /// Entries that passed every entry-level check.
    pub verified_entries: u64,
    /// Entry-level failures first, then linkage failures, each by index.
    pub failures: Vec<Failure>,
    /// Wall-clock time spent verifying.
    pub elapsed: Duration,
}

impl VerificationReport {
    /// A chain is valid iff nothing failed. An empty chain is valid.
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of recorded failures, entry-level and linkage together.
    pub fn failed_entries(&self) -> u64 {
        self.failures.len() as u64
    }

    /// Failures recorded against one entry.
    pub fn failures_for(&self, index: u64) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.entry_index == index)
    }
}

impl Serialize for VerificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VerificationReport", 6)?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("total_entries", &self.total_entries)?;
        state.serialize_field("verified_entries", &self.verified_entries)?;
        state.serialize_field("failed_entries", &self.failed_entries())?;
        state.serialize_field("failures", &self.failures)?;
        state.serialize_field("elapsed_ms", &(self.elapsed.as_millis() as u64))?;
        state.end()
    }
}

/// Re-derives every invariant of a stored chain.
pub struct Verifier<'s, S: ChainStore + ?Sized, A: ArtifactResolver> {
    store: &'s S,
    verify_key: VerifyKey,
    artifacts: A,
}

impl<'s, S: ChainStore + ?Sized, A: ArtifactResolver> Verifier<'s, S, A> {
    pub fn new(store: &'s S, verify_key: VerifyKey, artifacts: A) -> Self {
        Self {
            store,
            verify_key,
            artifacts,
        }
    }

    pub fn verify_key(&self) -> &VerifyKey {
        &self.verify_key
    }

    /// Check one entry in isolation.
    ///
    /// Order: artifact exists and matches, signature, entry hash. Only the
    /// first failing check is reported.
    pub fn verify_entry(&self, entry: &ChainEntry) -> std::result::Result<(), Failure> {
        let actual = self.artifacts.digest(&entry.artifact_ref).map_err(|e| {
            Failure::new(entry.index, FailureKind::ArtifactMissing, e.to_string())
        })?;

        if actual != entry.artifact_hash {
            return Err(Failure::new(
                entry.index,
                FailureKind::ArtifactHashMismatch,
                format!(
                    "expected {}..., got {}...",
                    prefix(&entry.artifact_hash),
                    prefix(&actual)
                ),
            ));
        }

        if !verify_signature(&self.verify_key, entry) {
            return Err(Failure::new(
                entry.index,
                FailureKind::SignatureInvalid,
                "signature does not match canonical form",
            ));
        }

        if !verify_entry_hash(entry) {
            return Err(Failure::new(
                entry.index,
                FailureKind::EntryHashMismatch,
                format!(
                    "stored {}..., recomputed {}...",
                    prefix(&entry.entry_hash),
                    prefix(&entry.compute_entry_hash())
                ),
            ));
        }

        Ok(())
    }

    /// Verify every stored entry and the linkage between them.
    pub fn verify_full_chain(&self) -> Result<VerificationReport> {
        let started = Instant::now();
        let entries = self.store.get_all()?;
        debug!(entries = entries.len(), "verifying chain");

        let mut report = VerificationReport {
            total_entries: entries.len() as u64,
            ..VerificationReport::default()
        };

        for entry in &entries {
            match self.verify_entry(entry) {
                Ok(()) => report.verified_entries += 1,
                Err(failure) => {
                    warn!(%failure, "entry failed verification");
                    report.failures.push(failure);
                }
            }
        }

        for failure in verify_linkage(&entries) {
            warn!(%failure, "linkage check failed");
            report.failures.push(failure);
        }

        report.elapsed = started.elapsed();
        info!(
            valid = report.is_valid(),
            total = report.total_entries,
            verified = report.verified_entries,
            failed = report.failed_entries(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "chain verification finished"
        );
        Ok(report)
    }
}

/// Check genesis shape and pairwise linkage of an index-ordered sequence.
///
/// Runs over the whole sequence regardless of entry-level results. Each
/// broken pair is reported once, against the later entry.
pub fn verify_linkage(entries: &[ChainEntry]) -> Vec<Failure> {
    let mut failures = Vec::new();

    let Some(genesis) = entries.first() else {
        return failures;
    };

    if !genesis.is_genesis() {
        failures.push(Failure::new(
            genesis.index,
            FailureKind::InvalidGenesis,
            format!("first entry has index {}, expected 0", genesis.index),
        ));
    } else if !genesis.previous_hash.is_empty() {
        failures.push(Failure::new(
            genesis.index,
            FailureKind::InvalidGenesis,
            format!(
                "genesis previous_hash should be empty, got {}...",
                prefix(&genesis.previous_hash)
            ),
        ));
    }

    for pair in entries.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);

        if prev.index.checked_add(1) != Some(curr.index) {
            failures.push(Failure::new(
                curr.index,
                FailureKind::LinkageBroken,
                format!("index gap: {} follows {}", curr.index, prev.index),
            ));
        } else if curr.previous_hash != prev.entry_hash {
            failures.push(Failure::new(
                curr.index,
                FailureKind::LinkageBroken,
                format!(
                    "expected previous_hash {}..., got {}...",
                    prefix(&prev.entry_hash),
                    prefix(&curr.previous_hash)
                ),
            ));
        }
    }

    failures
}

/// Leading characters of a digest, safe on short or non-ASCII input.
fn prefix(digest: &str) -> &str {
    match digest.char_indices().nth(DIGEST_PREFIX) {
        Some((end, _)) => &digest[..end],
        None => digest,
    }
}

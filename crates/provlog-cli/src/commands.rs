//! Command handlers.
//!
//! Each handler opens what it needs from the resolved [`Config`], does one
//! thing, and writes human-readable output.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use provlog::core::{generate_keypair, load_verify_key, now_timestamp};
use provlog::store::{export_file, import_file, ChainStore, SqliteStore};
use provlog::{
    ChainEntry, CompositeMetadata, Config, Ledger, StaticMetadata, VerificationReport, Verifier,
};
use serde::Serialize;
use tracing::info;

use crate::Outcome;

/// Report file written by `provlog report`.
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    verification_timestamp: String,
    database: String,
    result: &'a VerificationReport,
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.database)
        .with_context(|| format!("failed to open chain database {}", config.database.display()))
}

fn run_verification(config: &Config, store: &SqliteStore) -> Result<VerificationReport> {
    let public_key = config.key_paths().public_key;
    let key = load_verify_key(&public_key)
        .with_context(|| format!("failed to load verification key {}", public_key.display()))?;
    Ok(Verifier::new(store, key, config.artifacts()).verify_full_chain()?)
}

pub fn keygen(config: &Config, force: bool, out: &mut dyn Write) -> Result<Outcome> {
    let paths = config.key_paths();
    if paths.private_key.exists() && !force {
        bail!(
            "a signing key already exists at {} (use --force to replace it)",
            paths.private_key.display()
        );
    }

    let keypair = generate_keypair(&paths).context("failed to generate keypair")?;
    info!(key = %keypair.verify_key(), "generated keypair");

    writeln!(out, "private key: {}", paths.private_key.display())?;
    writeln!(out, "public key:  {}", paths.public_key.display())?;
    writeln!(out, "{}", keypair.verify_key())?;
    Ok(Outcome::OK)
}

pub fn record(
    config: &Config,
    artifact: &Path,
    meta: &[String],
    out: &mut dyn Write,
) -> Result<Outcome> {
    let store = open_store(config)?;
    let ledger = Ledger::open(&store, &config.key_paths()).context("failed to load signing key")?;

    let mut file_info = StaticMetadata::new();
    if let Some(name) = artifact.file_name() {
        file_info = file_info.with("filename", name.to_string_lossy().into_owned());
    }
    let source = CompositeMetadata::new()
        .section("artifact", file_info)
        .section("context", StaticMetadata::from_pairs(meta));

    let artifacts = config.artifacts();
    let artifact_ref = artifacts
        .reference_for(artifact)
        .with_context(|| format!("failed to resolve {}", artifact.display()))?;
    let entry = ledger
        .record_resolved(&artifacts, &artifact_ref, &source)
        .with_context(|| format!("failed to record {}", artifact.display()))?;

    writeln!(
        out,
        "entry #{:04} {} {}",
        entry.index, entry.timestamp, entry.entry_hash
    )?;
    Ok(Outcome::OK)
}

pub fn verify(config: &Config, json: bool, quiet: bool, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    let report = run_verification(config, &store)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        if !quiet {
            print_entry_lines(&store, &report, out)?;
        }
        print_summary(&report, quiet, out)?;
    }

    Ok(if report.is_valid() {
        Outcome::OK
    } else {
        Outcome::FAILED
    })
}

fn print_entry_lines(
    store: &SqliteStore,
    report: &VerificationReport,
    out: &mut dyn Write,
) -> Result<()> {
    for entry in store.get_all()? {
        match report.failures_for(entry.index).next() {
            None => writeln!(out, "entry #{:04} OK   {}", entry.index, entry.timestamp)?,
            Some(failure) => writeln!(out, "entry #{:04} FAIL {}", entry.index, failure.reason)?,
        }
    }
    writeln!(out)?;
    Ok(())
}

fn print_summary(report: &VerificationReport, quiet: bool, out: &mut dyn Write) -> Result<()> {
    if report.is_valid() {
        writeln!(
            out,
            "VERIFICATION PASSED: {} of {} entries verified in {} ms",
            report.verified_entries,
            report.total_entries,
            report.elapsed.as_millis()
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "VERIFICATION FAILED: {} failures across {} entries",
        report.failed_entries(),
        report.total_entries
    )?;
    if !quiet {
        for failure in &report.failures {
            writeln!(out, "  {}", failure)?;
        }
    }
    Ok(())
}

fn print_entry(entry: &ChainEntry, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(entry)?)?;
    Ok(())
}

pub fn show(config: &Config, index: u64, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    match store.get_by_index(index)? {
        Some(entry) => {
            print_entry(&entry, out)?;
            Ok(Outcome::OK)
        }
        None => bail!("no entry with index {}", index),
    }
}

pub fn latest(config: &Config, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    match store.get_latest()? {
        Some(entry) => print_entry(&entry, out)?,
        None => writeln!(out, "chain is empty")?,
    }
    Ok(Outcome::OK)
}

pub fn status(config: &Config, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    let paths = config.key_paths();

    writeln!(out, "database:    {}", config.database.display())?;
    writeln!(out, "entries:     {}", store.count()?)?;
    match store.get_latest()? {
        Some(entry) => {
            writeln!(out, "head:        #{} at {}", entry.index, entry.timestamp)?;
            writeln!(out, "head hash:   {}", entry.entry_hash)?;
        }
        None => writeln!(out, "head:        (empty chain)")?,
    }
    match load_verify_key(&paths.public_key) {
        Ok(key) => writeln!(out, "public key:  {}", key)?,
        Err(e) => writeln!(out, "public key:  unavailable ({})", e)?,
    }
    writeln!(
        out,
        "signing key: {}",
        if paths.private_key.exists() { "present" } else { "missing" }
    )?;
    Ok(Outcome::OK)
}

pub fn export(config: &Config, file: &Path, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    let count = export_file(&store, file)
        .with_context(|| format!("failed to export to {}", file.display()))?;
    writeln!(out, "exported {} entries to {}", count, file.display())?;
    Ok(Outcome::OK)
}

pub fn import(config: &Config, file: &Path, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    let report = import_file(&store, file)
        .with_context(|| format!("failed to import from {}", file.display()))?;
    writeln!(
        out,
        "imported {} entries, skipped {} existing",
        report.imported, report.skipped
    )?;
    Ok(Outcome::OK)
}

pub fn report(config: &Config, file: &Path, out: &mut dyn Write) -> Result<Outcome> {
    let store = open_store(config)?;
    let result = run_verification(config, &store)?;

    let contents = ReportFile {
        verification_timestamp: now_timestamp(),
        database: config.database.display().to_string(),
        result: &result,
    };
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(file, serde_json::to_string_pretty(&contents)?)
        .with_context(|| format!("failed to write report {}", file.display()))?;

    writeln!(out, "verification report written to {}", file.display())?;
    Ok(if result.is_valid() {
        Outcome::OK
    } else {
        Outcome::FAILED
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Env {
        dir: tempfile::TempDir,
        config: Config,
    }

    impl Env {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config {
                keys_dir: dir.path().join("keys"),
                database: dir.path().join("chain.db"),
                artifact_root: None,
            };
            keygen(&config, false, &mut Vec::new()).unwrap();
            Self { dir, config }
        }

        fn artifact(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<Outcome>) -> (Outcome, String) {
        let mut buf = Vec::new();
        let outcome = f(&mut buf).unwrap();
        (outcome, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_keygen_refuses_overwrite() {
        let env = Env::new();
        assert!(keygen(&env.config, false, &mut Vec::new()).is_err());
        assert!(keygen(&env.config, true, &mut Vec::new()).is_ok());
    }

    #[test]
    fn test_record_then_verify() {
        let env = Env::new();
        let frame = env.artifact("frame_0000.jpg", b"pixels");
        let meta = vec!["lane=2".to_string()];

        let (outcome, text) = output(|out| record(&env.config, &frame, &meta, out));
        assert_eq!(outcome, Outcome::OK);
        assert!(text.starts_with("entry #0000"));

        let (outcome, text) = output(|out| verify(&env.config, false, false, out));
        assert_eq!(outcome, Outcome::OK);
        assert!(text.contains("VERIFICATION PASSED"));

        let (_, text) = output(|out| show(&env.config, 0, out));
        let entry: ChainEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(entry.metadata["artifact"]["filename"], "frame_0000.jpg");
        assert_eq!(entry.metadata["context"]["lane"], 2);
    }

    #[test]
    fn test_record_under_artifact_root() {
        let mut env = Env::new();
        let root = env.dir.path().join("frames");
        fs::create_dir_all(&root).unwrap();
        env.config.artifact_root = Some(root.clone());
        let frame = env.artifact("frames/a.jpg", b"pixels");
        let outside = env.artifact("b.jpg", b"more pixels");

        record(&env.config, &frame, &[], &mut Vec::new()).unwrap();
        record(&env.config, &outside, &[], &mut Vec::new()).unwrap();

        let (_, text) = output(|out| show(&env.config, 0, out));
        let entry: ChainEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(entry.artifact_ref, "a.jpg");

        let (outcome, text) = output(|out| verify(&env.config, false, false, out));
        assert_eq!(outcome, Outcome::OK, "{}", text);
        assert!(text.contains("VERIFICATION PASSED"));
    }

    #[test]
    fn test_verify_fails_after_tampering() {
        let env = Env::new();
        let frame = env.artifact("frame_0000.jpg", b"pixels");
        record(&env.config, &frame, &[], &mut Vec::new()).unwrap();
        fs::write(&frame, b"edited").unwrap();

        let (outcome, text) = output(|out| verify(&env.config, true, false, out));
        assert_eq!(outcome, Outcome::FAILED);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["failures"][0]["reason"], "artifact_hash_mismatch");
    }

    #[test]
    fn test_report_file() {
        let env = Env::new();
        let frame = env.artifact("frame_0000.jpg", b"pixels");
        record(&env.config, &frame, &[], &mut Vec::new()).unwrap();

        let path = env.dir.path().join("reports").join("report.json");
        let (outcome, _) = output(|out| report(&env.config, &path, out));
        assert_eq!(outcome, Outcome::OK);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["result"]["valid"], true);
        assert_eq!(json["result"]["total_entries"], 1);
        assert!(json["verification_timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_latest_and_status_on_empty_chain() {
        let env = Env::new();
        let (_, text) = output(|out| latest(&env.config, out));
        assert_eq!(text.trim(), "chain is empty");

        let (_, text) = output(|out| status(&env.config, out));
        assert!(text.contains("entries:     0"));
        assert!(text.contains("signing key: present"));
    }

    #[test]
    fn test_show_missing_index() {
        let env = Env::new();
        assert!(show(&env.config, 3, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_export_import() {
        let env = Env::new();
        for i in 0..2 {
            let frame = env.artifact(&format!("frame_{}.jpg", i), format!("{}", i).as_bytes());
            record(&env.config, &frame, &[], &mut Vec::new()).unwrap();
        }
        let file = env.dir.path().join("chain.json");
        export(&env.config, &file, &mut Vec::new()).unwrap();

        let copy = Config {
            database: env.dir.path().join("copy.db"),
            ..env.config.clone()
        };
        let (_, text) = output(|out| import(&copy, &file, out));
        assert_eq!(text.trim(), "imported 2 entries, skipped 0 existing");

        let (outcome, _) = output(|out| verify(&copy, false, true, out));
        assert_eq!(outcome, Outcome::OK);
    }
}

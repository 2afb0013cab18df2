//! provlog command-line interface.
//!
//! The binary in `main.rs` only installs logging and calls [`run`]; argument
//! handling and command dispatch live here so they can be tested.

pub mod commands;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use provlog::Config;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "provlog.toml";

/// Tamper-evident provenance chain for captured artifacts.
#[derive(Parser, Debug)]
#[command(name = "provlog", version)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the key files (overrides the config file).
    #[arg(long, global = true)]
    pub keys: Option<PathBuf>,

    /// Chain database path (overrides the config file).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Base directory for relative artifact references.
    #[arg(long, global = true)]
    pub artifact_root: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the signing keypair.
    Keygen {
        /// Replace an existing keypair.
        #[arg(long)]
        force: bool,
    },
    /// Hash an artifact and append it to the chain.
    Record {
        /// Path of the artifact file.
        artifact: PathBuf,
        /// Metadata as key=value; repeatable.
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },
    /// Verify every entry and the linkage of the whole chain.
    Verify {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
        /// Print only the summary line.
        #[arg(long, conflicts_with = "json")]
        quiet: bool,
    },
    /// Print one entry.
    Show {
        /// Entry index.
        index: u64,
    },
    /// Print the newest entry.
    Latest,
    /// Summarize the chain and key setup.
    Status,
    /// Write the chain to a JSON file.
    Export {
        /// Destination file.
        file: PathBuf,
    },
    /// Append entries from an exported JSON file.
    Import {
        /// Source file.
        file: PathBuf,
    },
    /// Verify and write a JSON report.
    Report {
        /// Destination file.
        file: PathBuf,
    },
}

/// What a command left for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
}

impl Outcome {
    pub const OK: Outcome = Outcome { success: true };
    pub const FAILED: Outcome = Outcome { success: false };
}

impl Cli {
    /// Resolve the effective configuration: file, then flags.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::load(DEFAULT_CONFIG_FILE)?,
            None => Config::default(),
        };

        if let Some(keys) = &self.keys {
            config.keys_dir = keys.clone();
        }
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(root) = &self.artifact_root {
            config.artifact_root = Some(root.clone());
        }
        Ok(config)
    }
}

/// Run a parsed command line, writing user-facing output to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<Outcome> {
    let config = cli.resolve_config()?;
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Keygen { force } => commands::keygen(&config, force, out),
        Commands::Record { artifact, meta } => commands::record(&config, &artifact, &meta, out),
        Commands::Verify { json, quiet } => commands::verify(&config, json, quiet, out),
        Commands::Show { index } => commands::show(&config, index, out),
        Commands::Latest => commands::latest(&config, out),
        Commands::Status => commands::status(&config, out),
        Commands::Export { file } => commands::export(&config, &file, out),
        Commands::Import { file } => commands::import(&config, &file, out),
        Commands::Report { file } => commands::report(&config, &file, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "provlog",
            "--keys",
            "/k",
            "--db",
            "/d/chain.db",
            "verify",
            "--json",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.keys_dir, PathBuf::from("/k"));
        assert_eq!(config.database, PathBuf::from("/d/chain.db"));
        assert!(matches!(cli.command, Commands::Verify { json: true, quiet: false }));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "keys_dir = \"/from-file\"\ndatabase = \"/file.db\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "provlog",
            "--config",
            path.to_str().unwrap(),
            "--db",
            "/flag.db",
            "status",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.keys_dir, PathBuf::from("/from-file"));
        assert_eq!(config.database, PathBuf::from("/flag.db"));
    }

    #[test]
    fn test_record_collects_meta() {
        let cli = Cli::try_parse_from([
            "provlog", "record", "a.jpg", "--meta", "lane=2", "--meta", "site=north",
        ])
        .unwrap();
        match cli.command {
            Commands::Record { artifact, meta } => {
                assert_eq!(artifact, PathBuf::from("a.jpg"));
                assert_eq!(meta, vec!["lane=2", "site=north"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_json() {
        assert!(Cli::try_parse_from(["provlog", "verify", "--json", "--quiet"]).is_err());
    }
}

//! File-based configuration.
//!
//! ```toml
//! keys_dir = "/etc/provlog/keys"
//! database = "/var/lib/provlog/chain.db"
//! artifact_root = "/var/lib/provlog/frames"
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use provlog_core::KeyPaths;
use serde::{Deserialize, Serialize};

use crate::artifact::FsArtifacts;
use crate::error::{Error, Result};

/// Locations of keys, the chain database, and artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `private_key.pem` and `public_key.pem`.
    pub keys_dir: PathBuf,

    /// Path of the SQLite chain database.
    pub database: PathBuf,

    /// Base directory for relative artifact references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("keys"),
            database: PathBuf::from("data").join("chain.db"),
            artifact_root: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The fixed key file locations inside `keys_dir`.
    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::in_dir(&self.keys_dir)
    }

    /// An artifact resolver rooted at `artifact_root`, if set.
    pub fn artifacts(&self) -> FsArtifacts {
        match &self.artifact_root {
            Some(root) => FsArtifacts::with_root(root),
            None => FsArtifacts::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.keys_dir, PathBuf::from("keys"));
        assert_eq!(config.database, PathBuf::from("data/chain.db"));
        assert_eq!(
            config.key_paths().private_key,
            PathBuf::from("keys/private_key.pem")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(r#"database = "/srv/chain.db""#).unwrap();
        assert_eq!(config.database, PathBuf::from("/srv/chain.db"));
        assert_eq!(config.keys_dir, PathBuf::from("keys"));
        assert!(config.artifact_root.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provlog.toml");
        fs::write(
            &path,
            "keys_dir = \"/k\"\ndatabase = \"/d/chain.db\"\nartifact_root = \"/frames\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.key_paths().public_key, PathBuf::from("/k/public_key.pem"));
        assert_eq!(config.artifacts().resolve("a.jpg"), PathBuf::from("/frames/a.jpg"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "database = [").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
        assert!(matches!(
            Config::load(dir.path().join("absent.toml")),
            Err(Error::Config(_))
        ));
    }
}

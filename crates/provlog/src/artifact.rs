//! Resolving artifact references to content digests.

use std::path::{Path, PathBuf};

use provlog_core::{hash_file, CoreError};

/// Turns an entry's `artifact_ref` into the current digest of its content.
pub trait ArtifactResolver {
    /// Hex SHA-256 of the referenced artifact as it exists now.
    ///
    /// Returns [`CoreError::ArtifactMissing`] if the artifact cannot be read.
    fn digest(&self, artifact_ref: &str) -> Result<String, CoreError>;
}

impl<A: ArtifactResolver + ?Sized> ArtifactResolver for &A {
    fn digest(&self, artifact_ref: &str) -> Result<String, CoreError> {
        (**self).digest(artifact_ref)
    }
}

/// Resolves references as filesystem paths.
///
/// Relative references are joined onto the root directory when one is set;
/// absolute references are used as-is.
#[derive(Debug, Clone, Default)]
pub struct FsArtifacts {
    root: Option<PathBuf>,
}

impl FsArtifacts {
    /// Resolve references relative to the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// The path a reference resolves to.
    pub fn resolve(&self, artifact_ref: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(artifact_ref),
            None => Path::new(artifact_ref).to_path_buf(),
        }
    }

    /// The reference under which `path` resolves back to the same file.
    ///
    /// Paths under the root are stored relative to it. Other relative paths
    /// are anchored to the working directory so the root is not applied to
    /// them on resolution.
    pub fn reference_for(&self, path: &Path) -> Result<String, CoreError> {
        let root = match &self.root {
            Some(root) => root,
            None => return Ok(path.to_string_lossy().into_owned()),
        };

        if let Ok(relative) = path.strip_prefix(root) {
            return Ok(relative.to_string_lossy().into_owned());
        }
        if path.is_absolute() {
            return Ok(path.to_string_lossy().into_owned());
        }
        let anchored = std::env::current_dir()?.join(path);
        Ok(anchored.to_string_lossy().into_owned())
    }
}

impl ArtifactResolver for FsArtifacts {
    fn digest(&self, artifact_ref: &str) -> Result<String, CoreError> {
        hash_file(self.resolve(artifact_ref))
    }
}

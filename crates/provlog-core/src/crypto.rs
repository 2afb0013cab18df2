//! Cryptographic primitives: Ed25519 signing and SHA-256 hashing.
//!
//! Signatures and digests travel through the log as lowercase hex text, so the
//! helpers here produce and consume hex rather than raw byte arrays.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Chunk size used when streaming files through the hasher.
pub const HASH_CHUNK_SIZE: usize = 8192;

/// File name of the hex-encoded signing seed inside a keys directory.
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// File name of the hex-encoded verification key inside a keys directory.
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// Compute the SHA-256 digest of `data` as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Stream a reader through SHA-256 in [`HASH_CHUNK_SIZE`] chunks.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of a file's full content.
///
/// Memory use is bounded by the chunk size regardless of file size.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let missing = |source| CoreError::ArtifactMissing {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(missing)?;
    hash_reader(file).map_err(missing)
}

/// An Ed25519 verification key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerifyKey(VerifyingKey);

impl VerifyKey {
    /// Parse from a hex string (32 bytes).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_key_hex(s, "hex string")?;
        VerifyingKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|e| CoreError::KeyFormat {
                origin: "hex string".into(),
                reason: e.to_string(),
            })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Check a hex-encoded signature over `message`.
    ///
    /// Malformed hex, a wrong length, or a cryptographic mismatch all yield
    /// `false`.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        let Ok(bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&bytes);
        self.0.verify(message, &signature).is_ok()
    }
}

impl fmt::Debug for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyKey({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The signing half of the log's keypair.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new keypair from the OS entropy source.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Get the verification key.
    pub fn verify_key(&self) -> VerifyKey {
        VerifyKey(self.signing_key.verifying_key())
    }

    /// Sign a message, returning the signature as hex.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }

    /// Persist both halves of the keypair.
    ///
    /// The private half is written owner-only (0600 on Unix), the public half
    /// world-readable (0644).
    pub fn save(&self, paths: &KeyPaths) -> Result<()> {
        for path in [&paths.private_key, &paths.public_key] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        write_private(&paths.private_key, hex::encode(self.signing_key.to_bytes()).as_bytes())?;
        fs::write(&paths.public_key, self.verify_key().to_hex())?;
        set_mode(&paths.public_key, 0o644)?;

        Ok(())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.verify_key())
    }
}

/// Locations of the two key files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl KeyPaths {
    /// The fixed file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            private_key: dir.join(PRIVATE_KEY_FILE),
            public_key: dir.join(PUBLIC_KEY_FILE),
        }
    }
}

/// Generate a fresh keypair and persist it.
pub fn generate_keypair(paths: &KeyPaths) -> Result<KeyPair> {
    let keypair = KeyPair::generate()?;
    keypair.save(paths)?;
    Ok(keypair)
}

/// Load the signing key from a hex seed file.
pub fn load_signing_key(path: impl AsRef<Path>) -> Result<KeyPair> {
    let path = path.as_ref();
    let seed = decode_key_hex(&read_key_file(path)?, &path.display().to_string())?;
    Ok(KeyPair::from_seed(&seed))
}

/// Load the verification key from a hex file.
pub fn load_verify_key(path: impl AsRef<Path>) -> Result<VerifyKey> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let bytes = decode_key_hex(&read_key_file(path)?, &origin)?;
    VerifyingKey::from_bytes(&bytes)
        .map(VerifyKey)
        .map_err(|e| CoreError::KeyFormat {
            origin,
            reason: e.to_string(),
        })
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CoreError::KeyNotFound {
            path: path.to_path_buf(),
        },
        _ => CoreError::Io(e),
    })
}

fn decode_key_hex(text: &str, origin: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(text.trim()).map_err(|e| CoreError::KeyFormat {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| CoreError::KeyFormat {
        origin: origin.to_string(),
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    set_mode(path, 0o600)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

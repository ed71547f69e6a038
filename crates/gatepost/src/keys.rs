//! Secret key provisioning for the token codec.
//!
//! Two 32-byte keys live in fixed files under the state directory and are
//! loaded once at startup. A missing file gets a fresh random key persisted
//! before first use; anything else that goes wrong here is startup-fatal and
//! must halt the bootstrapping caller.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::RngCore;
use thiserror::Error;
use tracing::info;

const HASH_KEY_FILE: &str = "hashkey.dat";
const BLOCK_KEY_FILE: &str = "blockkey.dat";

/// Raw length of each key file, in bytes.
pub const KEY_LEN: usize = 32;

/// Startup-fatal key provisioning failures.
#[derive(Debug, Error)]
pub enum KeyProvisioningError {
    /// A key file exists but cannot be read.
    #[error("cannot read key file {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },

    /// A key file exists but does not hold exactly [`KEY_LEN`] bytes.
    #[error("key file {path} holds {len} bytes, expected {KEY_LEN}")]
    WrongLength { path: PathBuf, len: usize },

    /// A freshly generated key could not be written out.
    #[error("cannot persist new key file {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },
}

/// The process-wide symmetric key material protecting session tokens.
///
/// Read-only after startup; shared by every codec instance without
/// synchronization. Never regenerated while valid key files exist.
pub struct SecretKeyPair {
    hash_key: [u8; KEY_LEN],
    block_key: [u8; KEY_LEN],
}

impl SecretKeyPair {
    /// Load both keys from `state_dir`, generating and persisting any that
    /// do not exist yet.
    pub fn load_or_generate(state_dir: &Path) -> Result<Self, KeyProvisioningError> {
        Ok(Self {
            hash_key: load_or_generate_key(state_dir, HASH_KEY_FILE)?,
            block_key: load_or_generate_key(state_dir, BLOCK_KEY_FILE)?,
        })
    }

    /// Use fixed key material, for tests and deployments that manage keys
    /// out of band.
    pub fn from_bytes(hash_key: [u8; KEY_LEN], block_key: [u8; KEY_LEN]) -> Self {
        Self {
            hash_key,
            block_key,
        }
    }

    pub(crate) fn hash_key(&self) -> &[u8; KEY_LEN] {
        &self.hash_key
    }

    pub(crate) fn block_key(&self) -> &[u8; KEY_LEN] {
        &self.block_key
    }
}

// Key bytes stay out of logs and error chains.
impl fmt::Debug for SecretKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeyPair").finish_non_exhaustive()
    }
}

fn load_or_generate_key(dir: &Path, name: &str) -> Result<[u8; KEY_LEN], KeyProvisioningError> {
    let path = dir.join(name);
    match fs::read(&path) {
        Ok(bytes) => {
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| KeyProvisioningError::WrongLength {
                    path,
                    len: bytes.len(),
                })
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut key = [0u8; KEY_LEN];
            rand::rng().fill_bytes(&mut key);
            persist_key(&path, &key)?;
            info!(file = %path.display(), "generated new session key");
            Ok(key)
        }
        Err(source) => Err(KeyProvisioningError::Unreadable { path, source }),
    }
}

fn persist_key(path: &Path, key: &[u8; KEY_LEN]) -> Result<(), KeyProvisioningError> {
    let persist_err = |source| KeyProvisioningError::Persist {
        path: path.to_path_buf(),
        source,
    };
    fs::write(path, key).map_err(persist_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(persist_err)?;
    }
    Ok(())
}

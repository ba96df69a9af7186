// ============================================================================
// SecretStore: local credential and token blobs
// ============================================================================
// Two small bincode files: consumer keys (kept forever) and the user access
// token (dropped when the operator logs out). Not safe for concurrent runs.
// ============================================================================

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{AccessTokens, ConsumerKeys};

/// File-backed store for the consumer keys and the access token pair
pub struct SecretStore {
    keys_path: PathBuf,
    tokens_path: PathBuf,
}

impl SecretStore {
    pub fn new(keys_path: impl Into<PathBuf>, tokens_path: impl Into<PathBuf>) -> Self {
        Self {
            keys_path: keys_path.into(),
            tokens_path: tokens_path.into(),
        }
    }

    pub fn tokens_path(&self) -> &Path {
        &self.tokens_path
    }

    // ========================================================================
    // Consumer Keys
    // ========================================================================

    pub fn load_keys(&self) -> Result<Option<ConsumerKeys>> {
        read_blob(&self.keys_path)
    }

    pub fn save_keys(&self, keys: &ConsumerKeys) -> Result<()> {
        write_blob(&self.keys_path, keys)?;
        info!("Saved consumer keys to {}", self.keys_path.display());
        Ok(())
    }

    // ========================================================================
    // Access Tokens
    // ========================================================================

    pub fn load_tokens(&self) -> Result<Option<AccessTokens>> {
        read_blob(&self.tokens_path)
    }

    pub fn save_tokens(&self, tokens: &AccessTokens) -> Result<()> {
        write_blob(&self.tokens_path, tokens)?;
        info!("Saved access token to {}", self.tokens_path.display());
        Ok(())
    }

    /// Remove the stored access token. Missing file is not an error.
    pub fn delete_tokens(&self) -> Result<()> {
        match std::fs::remove_file(&self.tokens_path) {
            Ok(()) => {
                info!("Removed access token at {}", self.tokens_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!(
                "Failed to remove {}: {}",
                self.tokens_path.display(),
                e
            )),
        }
    }
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No blob at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let value = bincode::deserialize(&bytes)
        .map_err(|e| anyhow!("Failed to deserialize {}: {}", path.display(), e))?;
    Ok(Some(value))
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let bytes =
        bincode::serialize(value).map_err(|e| anyhow!("Failed to serialize blob: {}", e))?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

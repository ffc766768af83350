//! Local persistence of the joined identity.

use std::path::PathBuf;

use crate::client::backend::Identity;
use crate::client::{ClientError, StorageConfig};

/// Reads and writes the identity file named by
/// [`StorageConfig::identity_path`].
///
/// Lifecycle: written on join, read on start-up, removed on sign-out or
/// when leaving the event.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Creates a store for the configured identity path.
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.identity_path.clone(),
        }
    }

    /// Loads the saved identity. A missing or corrupt file reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<Identity>, ClientError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt identity file");
                Ok(None)
            }
        }
    }

    /// Saves `identity`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure.
    pub async fn save(&self, identity: &Identity) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(identity)?).await?;
        Ok(())
    }

    /// Removes the saved identity. Succeeds if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure.
    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

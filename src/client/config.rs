//! Client configuration.
//!
//! [`ClientConfig`] says where the server is and how often to poll it.
//! [`StorageConfig`] says where local state lives. Both are built once at
//! start-up and passed to the components that need them.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default refresh interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Server connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Interval between background refreshes.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Creates a config for `base_url` with default timings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `SANTA_API_URL`, `SANTA_POLL_INTERVAL_MS` and
    /// `SANTA_REQUEST_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SANTA_API_URL").unwrap_or(defaults.base_url),
            poll_interval: std::env::var("SANTA_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.poll_interval, Duration::from_millis),
            request_timeout: std::env::var("SANTA_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
        }
    }
}

/// Locations of client-side persisted state.
///
/// The identity file is written on join and removed on sign-out. The
/// offline data file holds the whole exchange in offline mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Saved identity (participant id, display name, player key).
    pub identity_path: PathBuf,
    /// Offline exchange data.
    pub offline_data_path: PathBuf,
}

impl StorageConfig {
    /// Places both files inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            identity_path: dir.join("identity.json"),
            offline_data_path: dir.join("offline.json"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::in_dir(".secret-santa")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_paths_share_a_directory() {
        let config = StorageConfig::in_dir("/tmp/santa");
        assert_eq!(config.identity_path, PathBuf::from("/tmp/santa/identity.json"));
        assert_eq!(
            config.offline_data_path,
            PathBuf::from("/tmp/santa/offline.json")
        );
    }

    #[test]
    fn default_poll_interval_is_three_seconds() {
        assert_eq!(ClientConfig::default().poll_interval, Duration::from_secs(3));
    }
}

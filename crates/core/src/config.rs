//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8100").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Trusted header carrying the caller identity, set by an authenticating
    /// reverse proxy. The value is consumed opaquely and never parsed.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Maximum accepted upload request size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8100".to_string()
}

fn default_identity_header() -> String {
    "x-remote-user".to_string()
}

fn default_max_upload_bytes() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            identity_header: default_identity_header(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.identity_header.trim().is_empty() {
            return Err("server.identity_header cannot be empty".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Served file tree configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Root directory of the served tree.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("./data/files")
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// Process-wide access defaults, overridable per directory by sidecar files.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Allow uploads anywhere no sidecar says otherwise (default: false).
    #[serde(default)]
    pub upload: bool,
    /// Allow deletes anywhere no sidecar says otherwise (default: false).
    #[serde(default)]
    pub delete: bool,
}

/// Search index configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Interval in seconds between background index rebuilds.
    #[serde(default = "default_rebuild_interval_secs")]
    pub rebuild_interval_secs: u64,
    /// Delay in seconds before the first build after startup.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
}

fn default_rebuild_interval_secs() -> u64 {
    600 // 10 minutes
}

fn default_startup_delay_secs() -> u64 {
    1
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            rebuild_interval_secs: default_rebuild_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

impl IndexConfig {
    /// Get the rebuild interval as a Duration.
    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_secs(self.rebuild_interval_secs)
    }

    /// Get the startup delay as a Duration.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    /// Validate index configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        // A zero interval would spin the rebuild task in a hot loop.
        if self.rebuild_interval_secs == 0 {
            return Err("index.rebuild_interval_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Served file tree configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Process-wide access defaults.
    #[serde(default)]
    pub access: AccessConfig,
    /// Search index configuration.
    #[serde(default)]
    pub index: IndexConfig,
}

impl AppConfig {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.index.validate()?;
        Ok(())
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Callers are expected to point `files.root` at a
    /// temporary tree.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind, "127.0.0.1:8100");
        assert_eq!(config.server.identity_header, "x-remote-user");
        assert!(!config.access.upload);
        assert!(!config.access.delete);
        assert_eq!(config.index.rebuild_interval_secs, 600);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let yaml = "access:\n  upload: true\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.access.upload);
        assert!(!config.access.delete);
        assert_eq!(config.index.rebuild_interval_secs, 600);
        assert_eq!(config.files.root, PathBuf::from("./data/files"));
    }

    #[test]
    fn zero_rebuild_interval_rejected() {
        let mut config = AppConfig::default();
        config.index.rebuild_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_identity_header_rejected() {
        let mut config = AppConfig::default();
        config.server.identity_header = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn interval_helpers_convert_seconds() {
        let index = IndexConfig {
            rebuild_interval_secs: 90,
            startup_delay_secs: 2,
        };
        assert_eq!(index.rebuild_interval(), Duration::from_secs(90));
        assert_eq!(index.startup_delay(), Duration::from_secs(2));
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::infrastructure::storage::{DEFAULT_CONTAINER_PREFIX, DEFAULT_READ_ACL};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:6064";
pub const DEFAULT_BASE_PATH: &str = "/v1/api/blobserver";
pub const DEFAULT_SERVER_ADDR: &str = "http://localhost:6064/v1/api/blobserver";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Blob server configuration.
///
/// Sources, lowest precedence first: built-in defaults, an optional TOML
/// file, environment variables, command-line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub storage_root: PathBuf,
    pub cdn_url: String,
    pub container_prefix: String,
    pub container_read_acl: String,
    pub max_upload_bytes: usize,
    pub base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            storage_root: PathBuf::from("/data/blobs"),
            cdn_url: "http://localhost:6064/v1/api/blobserver/blob/fetch/".to_string(),
            container_prefix: DEFAULT_CONTAINER_PREFIX.to_string(),
            container_read_acl: DEFAULT_READ_ACL.to_string(),
            max_upload_bytes: 256 * 1024 * 1024,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&document)
    }

    /// Defaults, then the file if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env())
    }

    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Override fields from variables resolved by `lookup`.
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = lookup("STORAGE_ROOT") {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(url) = lookup("CDN_URL") {
            self.cdn_url = url;
        }
        if let Some(prefix) = lookup("CONTAINER_PREFIX") {
            self.container_prefix = prefix;
        }
        if let Some(max) = lookup("MAX_UPLOAD_BYTES").and_then(|s| s.parse().ok()) {
            self.max_upload_bytes = max;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("LISTEN_ADDR cannot be empty".to_string());
        }

        if self.cdn_url.is_empty() {
            return Err("CDN_URL cannot be empty".to_string());
        }

        if self.container_prefix.contains('/') || self.container_prefix.starts_with('.') {
            return Err("CONTAINER_PREFIX must not contain '/' or start with '.'".to_string());
        }

        // Blob sizes are carried as u32.
        if self.max_upload_bytes == 0 || self.max_upload_bytes as u64 > u64::from(u32::MAX) {
            return Err(format!(
                "MAX_UPLOAD_BYTES must be between 1 and {}",
                u32::MAX
            ));
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err("base_path must start with '/'".to_string());
        }

        Ok(())
    }
}

/// Settings of the `blob-sync` client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address including the API base path.
    pub server_addr: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(server_addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server_addr: server_addr.into(),
            timeout,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.server_addr.starts_with("http://") && !self.server_addr.starts_with("https://") {
            return Err("server address must start with http:// or https://".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

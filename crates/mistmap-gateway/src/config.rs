//! Configuration loading and typed config structures for the gateway.
//!
//! The canonical configuration lives in `mistmap-config.yaml` next to
//! the binary's working directory. This module defines strongly-typed
//! structs mirroring the YAML structure and a loader that reads the
//! file; every field has a sensible default so a missing file still
//! yields a runnable server.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level gateway configuration.
///
/// Mirrors the structure of `mistmap-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Network settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Document storage settings.
    #[serde(default)]
    pub storage: StorageSection,

    /// Controller authentication settings.
    #[serde(default)]
    pub auth: AuthSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `MISTMAP_HOST` overrides `server.host`
    /// - `MISTMAP_PORT` overrides `server.port`
    /// - `MISTMAP_WORLDS_ROOT` overrides `storage.worlds_root`
    /// - `MISTMAP_SECRET_FILE` overrides `auth.secret_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override configuration values with environment variables when set.
    ///
    /// This lets a container deployment adjust connection settings
    /// without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MISTMAP_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("MISTMAP_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("MISTMAP_WORLDS_ROOT") {
            self.storage.worlds_root = val;
        }
        if let Ok(val) = std::env::var("MISTMAP_SECRET_FILE") {
            self.auth.secret_file = val;
        }
    }
}

/// Network configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind (default `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on (default `8000`).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Document storage configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageSection {
    /// Folder holding one subfolder per world (default `worlds`).
    #[serde(default = "default_worlds_root")]
    pub worlds_root: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            worlds_root: default_worlds_root(),
        }
    }
}

/// Controller authentication configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSection {
    /// File holding the moderator's shared secret (default `admin.key`).
    #[serde(default = "default_secret_file")]
    pub secret_file: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            secret_file: default_secret_file(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8000
}

fn default_worlds_root() -> String {
    "worlds".to_owned()
}

fn default_secret_file() -> String {
    "admin.key".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.worlds_root, "worlds");
        assert_eq!(config.auth.secret_file, "admin.key");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "0.0.0.0"
  port: 9000

storage:
  worlds_root: "/srv/mistmap/worlds"

auth:
  secret_file: "/etc/mistmap/dm.key"

logging:
  level: "debug"
"#;
        let config = AppConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.worlds_root, "/srv/mistmap/worlds");
        assert_eq!(config.auth.secret_file, "/etc/mistmap/dm.key");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "server:\n  port: 8100\n";
        let config = AppConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Port is overridden, everything else uses defaults.
        assert_eq!(config.server.port, 8100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.worlds_root, "worlds");
    }

    #[test]
    fn parse_empty_yaml() {
        let config = AppConfig::parse("");
        assert!(config.is_ok());
    }
}

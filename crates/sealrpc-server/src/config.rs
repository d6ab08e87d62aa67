// ============================================
// File: crates/sealrpc-server/src/config.rs
// ============================================
//! # Server Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the RPC server binary and for
//! applications that embed the server, loaded from TOML files.
//!
//! ## Main Functionality
//! - `ServerConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Default values
//!
//! ## Configuration Sections
//! - `network`: TCP listen address
//! - `tls`: Certificate chain and private key files
//! - `limits`: Connection cap and frame size limit
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:8443"
//!
//! [tls]
//! cert_file = "/etc/sealrpc/server.crt"
//! key_file = "/etc/sealrpc/server.key"
//!
//! [limits]
//! max_connections = 1024
//! max_frame_size = 16777216
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - All config changes require server restart
//! - Validate config before server startup
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use sealrpc_common::logging::LogLevel;
use sealrpc_core::protocol::messages::DEFAULT_MAX_FRAME_SIZE;

use crate::error::{Result, ServerError};

/// Smallest frame limit that still fits a request header and a short name.
const MIN_FRAME_SIZE: usize = 64;

// ============================================
// ServerConfig
// ============================================

/// Main server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// TLS credential files.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.tls.validate()?;
        self.limits.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Returns listen address (from network config).
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        self.network.listen_addr
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8443))
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.listen_addr.port() == 0 {
            return Err(ServerError::config_invalid(
                "network.listen_addr",
                "port cannot be 0",
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

// ============================================
// TlsConfig
// ============================================

/// TLS credential files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM certificate chain, leaf first.
    #[serde(default = "default_cert_file")]
    pub cert_file: PathBuf,

    /// PEM private key matching the leaf certificate.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

fn default_cert_file() -> PathBuf {
    PathBuf::from("/etc/sealrpc/server.crt")
}

fn default_key_file() -> PathBuf {
    PathBuf::from("/etc/sealrpc/server.key")
}

impl TlsConfig {
    fn validate(&self) -> Result<()> {
        if self.cert_file.as_os_str().is_empty() {
            return Err(ServerError::config_invalid("tls.cert_file", "cannot be empty"));
        }
        if self.key_file.as_os_str().is_empty() {
            return Err(ServerError::config_invalid("tls.key_file", "cannot be empty"));
        }
        Ok(())
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_file: default_cert_file(),
            key_file: default_key_file(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

/// Resource limits configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Maximum frame body size in bytes, both directions.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

fn default_max_connections() -> usize {
    1024
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ServerError::config_invalid(
                "limits.max_connections",
                "must be greater than 0",
            ));
        }

        if self.max_frame_size < MIN_FRAME_SIZE {
            return Err(ServerError::config_invalid(
                "limits.max_frame_size",
                format!("must be at least {MIN_FRAME_SIZE}"),
            ));
        }

        if u32::try_from(self.max_frame_size).is_err() {
            return Err(ServerError::config_invalid(
                "limits.max_frame_size",
                "cannot exceed u32::MAX",
            ));
        }

        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            max_frame_size: default_max_frame_size(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error, fatal).
    #[serde(default)]
    pub level: LogLevel,
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr().port(), 8443);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            listen_addr = "127.0.0.1:9443"

            [tls]
            cert_file = "/srv/rpc/chain.pem"
            key_file = "/srv/rpc/key.pem"

            [limits]
            max_connections = 10
            max_frame_size = 65536

            [logging]
            level = "debug"
        "#;

        let config = ServerConfig::from_str(toml).unwrap();
        assert_eq!(config.network.listen_addr.port(), 9443);
        assert_eq!(config.tls.cert_file, PathBuf::from("/srv/rpc/chain.pem"));
        assert_eq!(config.limits.max_connections, 10);
        assert_eq!(config.limits.max_frame_size, 65536);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ServerConfig::from_str("[network]\nlisten_addr = \"0.0.0.0:7000\"\n").unwrap();
        assert_eq!(config.limits.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(config.tls.key_file, default_key_file());
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_str("[limits]\nmax_connections = 0\n").unwrap_err();
        assert!(matches!(err, ServerError::ConfigInvalid { ref field, .. } if field == "limits.max_connections"));

        let err = ServerConfig::from_str("[network]\nlisten_addr = \"0.0.0.0:0\"\n").unwrap_err();
        assert!(err.is_config_error());

        let err = ServerConfig::from_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ServerError::ConfigLoad { .. }));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let config = ServerConfig::default();
        let parsed = ServerConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.network.listen_addr, config.network.listen_addr);
        assert_eq!(parsed.logging.level, config.logging.level);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = ServerConfig::load("/nonexistent/sealrpc.toml").await.unwrap_err();
        assert!(matches!(err, ServerError::ConfigLoad { .. }));
        assert!(err.is_fatal());
    }
}

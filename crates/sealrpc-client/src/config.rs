// ============================================
// File: crates/sealrpc-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Lets `sealrpc-call` and embedding applications describe which server to
//! reach and which certificates to trust in a TOML file.
//!
//! ## Example Configuration
//! ```toml
//! [server]
//! address = "rpc.internal:8443"
//! # server_name = "rpc.internal"
//!
//! [tls]
//! trust_file = "/etc/sealrpc/ca.pem"
//!
//! [client]
//! display_name = "ops-console"
//!
//! [limits]
//! max_frame_size = 16777216
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use sealrpc_common::logging::LogLevel;
use sealrpc_core::protocol::messages::DEFAULT_MAX_FRAME_SIZE;

use crate::error::{ClientError, Result};

// ============================================
// ClientConfig
// ============================================

/// Main client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server to connect to.
    #[serde(default)]
    pub server: ServerSection,

    /// Trust anchors.
    #[serde(default)]
    pub tls: TlsSection,

    /// Client identity.
    #[serde(default)]
    pub client: ClientSection,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ClientConfig {
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
            .map_err(|e| ClientError::config(&path_str, e.to_string()))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ClientError::config(&path_str, e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ClientError::config("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(ClientError::config_invalid("server.address", "cannot be empty"));
        }

        if let Some(name) = &self.server.server_name {
            if name.trim().is_empty() {
                return Err(ClientError::config_invalid(
                    "server.server_name",
                    "cannot be empty when set",
                ));
            }
        }

        if self.tls.trust_file.as_os_str().is_empty() {
            return Err(ClientError::config_invalid("tls.trust_file", "cannot be empty"));
        }

        if self.limits.max_frame_size == 0 || u32::try_from(self.limits.max_frame_size).is_err() {
            return Err(ClientError::config_invalid(
                "limits.max_frame_size",
                "must be between 1 and u32::MAX",
            ));
        }

        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// Sections
// ============================================

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// `host:port` to dial.
    #[serde(default = "default_address")]
    pub address: String,

    /// TLS server name; defaults to the host part of `address`.
    #[serde(default)]
    pub server_name: Option<String>,
}

fn default_address() -> String {
    "127.0.0.1:8443".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            server_name: None,
        }
    }
}

/// `[tls]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsSection {
    /// PEM file with the accepted CA certificates.
    #[serde(default = "default_trust_file")]
    pub trust_file: PathBuf,
}

fn default_trust_file() -> PathBuf {
    PathBuf::from("/etc/sealrpc/ca.pem")
}

impl Default for TlsSection {
    fn default() -> Self {
        Self {
            trust_file: default_trust_file(),
        }
    }
}

/// `[client]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    /// Name used in log lines only.
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

fn default_display_name() -> String {
    "sealrpc-call".to_string()
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
        }
    }
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
    /// Maximum frame body size in bytes, both directions.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

// ============================================
// File: crates/sealrpc-client/src/error.rs
// ============================================
//! # Client Error Types
//!
//! ## Creation Reason
//! Separates what a caller can act on: a bad config, a server that could
//! not be reached, a broken connection, and an error the remote handler
//! chose to return.
//!
//! ## Error Categories
//! ```text
//! ClientError
//! ├── Config / ConfigInvalid   ← config file or trust anchors
//! ├── Dial                     ← connect or TLS handshake failed
//! ├── Transport                ← established connection failed
//! ├── Protocol                 ← peer broke the wire format
//! ├── Remote                   ← handler returned an error string
//! ├── Closed                   ← close() was called
//! └── InvalidMethod            ← name the codec cannot encode
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use sealrpc_common::error::CommonError;
use sealrpc_core::error::CoreError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    Config {
        /// File path
        path: String,
        /// Reason
        reason: String,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending field
        field: String,
        /// Reason
        reason: String,
    },

    /// Connection could not be established.
    #[error("Failed to dial {addr}: {reason}")]
    Dial {
        /// Address dialed
        addr: String,
        /// Reason
        reason: String,
    },

    /// The established connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server violated the wire protocol.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The remote handler returned an error.
    #[error("{method}: {message}")]
    Remote {
        /// Method that was called
        method: String,
        /// Error string sent by the server
        message: String,
    },

    /// The client was closed.
    #[error("Client is closed")]
    Closed,

    /// Method name rejected locally.
    #[error("Invalid method name '{name}': {reason}")]
    InvalidMethod {
        /// Name as given
        name: String,
        /// Reason
        reason: String,
    },

    /// Error from common utilities.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from the core crate (credentials).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ClientError {
    /// Creates a `Config` error.
    pub fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Dial` error.
    pub fn dial(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::Dial {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the remote error string, if this is a `Remote` error.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Remote { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Checks if the server answered with an error.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Checks if this is a config or credential error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        match self {
            Self::Config { .. } | Self::ConfigInvalid { .. } => true,
            Self::Core(e) => e.is_config_error(),
            _ => false,
        }
    }

    /// Checks if the connection is unusable after this error.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::Dial { .. } | Self::Transport(_) | Self::Protocol(_) | Self::Closed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_display_and_accessors() {
        let err = ClientError::Remote {
            method: "Calc.Div".into(),
            message: "division by zero".into(),
        };
        assert_eq!(err.to_string(), "Calc.Div: division by zero");
        assert_eq!(err.remote_message(), Some("division by zero"));
        assert!(err.is_remote());
        assert!(!err.is_connection_lost());
    }

    #[test]
    fn test_classification() {
        assert!(ClientError::Closed.is_connection_lost());
        assert!(ClientError::dial("127.0.0.1:1", "refused").is_connection_lost());
        assert!(ClientError::config("/x.toml", "missing").is_config_error());
        assert!(ClientError::Core(CoreError::EmptyTrustPool {
            path: "ca.pem".into()
        })
        .is_config_error());
        assert!(!ClientError::Protocol("bad".into()).is_config_error());
    }
}

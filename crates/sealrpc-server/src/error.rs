// ============================================
// File: crates/sealrpc-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use sealrpc_common::error::CommonError;
use sealrpc_core::error::CoreError;
use sealrpc_transport::error::TransportError;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Method '{name}' is already registered")]
    DuplicateMethod {
        name: String,
    },

    #[error("rpc: can't find method {name}")]
    MethodNotFound {
        name: String,
    },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn method_not_found(name: impl Into<String>) -> Self {
        Self::MethodNotFound { name: name.into() }
    }

    /// Bad config files and bad credentials both count.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        match self {
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } => true,
            Self::Core(e) => e.is_config_error(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateMethod { .. } | Self::Common(CommonError::InvalidInput { .. })
        )
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } => true,
            Self::Core(e) => e.is_config_error(),
            Self::Transport(e) => e.is_bind_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::config_load("/etc/sealrpc/server.toml", "file not found");
        assert!(err.to_string().contains("/etc/sealrpc/server.toml"));

        let err = ServerError::method_not_found("Calc.Sub");
        assert_eq!(err.to_string(), "rpc: can't find method Calc.Sub");
    }

    #[test]
    fn test_error_classification() {
        let config_err = ServerError::config_invalid("network.listen_addr", "bad");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let key_err: ServerError = CoreError::KeyMismatch {
            reason: "differs".into(),
        }
        .into();
        assert!(key_err.is_config_error());
        assert!(key_err.is_fatal());

        let dup = ServerError::DuplicateMethod {
            name: "Calc.Add".into(),
        };
        assert!(dup.is_registration_error());
        assert!(!dup.is_fatal());
    }

    #[test]
    fn test_bind_error_is_fatal() {
        let err: ServerError = TransportError::AddressInUse {
            addr: "127.0.0.1:8443".parse().unwrap(),
        }
        .into();
        assert!(err.is_fatal());
    }
}

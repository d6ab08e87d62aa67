// ============================================
// File: crates/sealrpc-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Socket, handshake and framing failures, kept apart from core's message
//! errors so callers can tell a dead peer from a misbehaving one.
//!
//! ## Error Categories
//! 1. **Network Errors**: bind, connect and handshake failures
//! 2. **Framing Errors**: oversized or truncated frames
//! 3. **Configuration Errors**: invalid addresses and server names
//! 4. **System Errors**: plain I/O failures with context
//!
//! ## ⚠️ Important Note for Next Developer
//! - Framing errors mean the stream is out of sync; never resume reading
//! - Handshake reasons come from rustls and contain no key material
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use sealrpc_common::error::CommonError;
use sealrpc_core::error::CoreError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    /// TCP connection could not be established.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Address we dialed
        addr: String,
        /// Why connecting failed
        reason: String,
    },

    /// TLS handshake failed.
    #[error("TLS handshake with {peer} failed: {reason}")]
    Handshake {
        /// Remote endpoint
        peer: String,
        /// Details from the TLS library
        reason: String,
    },

    // ========================================
    // Framing Errors
    // ========================================

    /// Peer announced a frame larger than the limit.
    #[error("Frame too large: max {max} bytes, announced {actual}")]
    FrameTooLarge {
        /// Maximum allowed body size
        max: usize,
        /// Announced body size
        actual: usize,
    },

    /// Stream ended in the middle of a frame.
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame {
        /// Bytes the frame part needed
        expected: usize,
        /// Bytes that arrived before EOF
        received: usize,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Invalid socket address.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    /// Invalid TLS server name.
    #[error("Invalid server name: {name}")]
    InvalidServerName {
        /// The rejected name
        name: String,
    },

    /// Listener is shutting down.
    #[error("Transport is shutting down")]
    ShuttingDown,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Handshake` error.
    pub fn handshake(peer: impl ToString, reason: impl Into<String>) -> Self {
        Self::Handshake {
            peer: peer.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the peer broke the framing or message rules.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        match self {
            Self::FrameTooLarge { .. } | Self::TruncatedFrame { .. } => true,
            Self::Core(err) => err.is_protocol_error(),
            _ => false,
        }
    }

    /// Returns `true` if the listener could not claim its address.
    #[must_use]
    pub const fn is_bind_error(&self) -> bool {
        matches!(self, Self::BindFailed { .. } | Self::AddressInUse { .. })
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: "unspecified I/O operation".into(),
            source: err,
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::bind_failed("127.0.0.1:8443".parse().unwrap(), "permission denied");
        assert!(err.to_string().contains("127.0.0.1:8443"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_error_classification() {
        let truncated = TransportError::TruncatedFrame {
            expected: 4,
            received: 2,
        };
        assert!(truncated.is_protocol_violation());

        let handshake = TransportError::handshake("127.0.0.1:1", "invalid peer certificate");
        assert!(!handshake.is_protocol_violation());
        assert!(handshake.to_string().contains("invalid peer certificate"));

        let bind = TransportError::AddressInUse {
            addr: "127.0.0.1:1".parse().unwrap(),
        };
        assert!(bind.is_bind_error());
        assert!(!bind.is_protocol_violation());
    }

    #[test]
    fn test_core_protocol_error_is_violation() {
        let err: TransportError = CoreError::malformed("bad").into();
        assert!(err.is_protocol_violation());

        let err: TransportError = CoreError::tls_config("no versions").into();
        assert!(!err.is_protocol_violation());
    }
}

// ============================================
// File: crates/sealrpc-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for wire-format parsing and credential loading.
//!
//! ## Error Categories
//! 1. **Credential Errors**: unreadable files, missing PEM blocks, key/cert
//!    mismatch. These are configuration errors and fatal at startup.
//! 2. **Protocol Errors**: malformed, truncated or oversized messages,
//!    version mismatch. These tear down the offending connection.
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or payload bytes in error messages
//! - File paths are fine; they come from the operator's own config
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use sealrpc_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and credential operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Credential Errors
    // ========================================

    /// Certificate file could not be read or parsed.
    #[error("Failed to load certificate from '{path}': {reason}")]
    CertificateLoad {
        /// File the certificate was read from
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// Private key file could not be read or parsed.
    #[error("Failed to load private key from '{path}': {reason}")]
    KeyLoad {
        /// File the key was read from
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// The private key does not belong to the certificate.
    #[error("Private key does not match certificate: {reason}")]
    KeyMismatch {
        /// Details from the TLS library
        reason: String,
    },

    /// Trust file contained no certificates.
    #[error("No trust anchors found in '{path}'")]
    EmptyTrustPool {
        /// File that was read
        path: String,
    },

    /// TLS configuration could not be built.
    #[error("TLS configuration failed: {reason}")]
    TlsConfig {
        /// Details from the TLS library
        reason: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Unknown or unsupported message type.
    #[error("Unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    /// Protocol version mismatch.
    #[error("Unsupported protocol version: {got}, expected {expected}")]
    UnsupportedVersion {
        /// Version received
        got: u8,
        /// Version expected
        expected: u8,
    },

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Message exceeds maximum allowed size.
    #[error("Message too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size
        actual: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `CertificateLoad` error.
    pub fn certificate_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CertificateLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `KeyLoad` error.
    pub fn key_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `TlsConfig` error.
    pub fn tls_config(reason: impl Into<String>) -> Self {
        Self::TlsConfig {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates a `MessageTooLarge` error.
    pub const fn too_large(max: usize, actual: usize) -> Self {
        Self::MessageTooLarge { max, actual }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error comes from bad credentials or TLS setup.
    ///
    /// Configuration errors are fatal at startup and never retried.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::CertificateLoad { .. }
                | Self::KeyLoad { .. }
                | Self::KeyMismatch { .. }
                | Self::EmptyTrustPool { .. }
                | Self::TlsConfig { .. }
        )
    }

    /// Returns `true` if this is a protocol error.
    ///
    /// Protocol errors mean the byte stream can no longer be trusted.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownMessageType(_)
                | Self::UnsupportedVersion { .. }
                | Self::MalformedMessage { .. }
                | Self::MessageTooShort { .. }
                | Self::MessageTooLarge { .. }
        )
    }
}

// ============================================
// Tests
// ============================================

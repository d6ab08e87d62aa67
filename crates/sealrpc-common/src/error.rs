// ============================================
// File: crates/sealrpc-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Method-name validation and the logging shim live below every other
//! crate, so their failures need a type that server, client and core can
//! all wrap.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include payload bytes or key material in error messages
//! - Each crate wraps `CommonError` with `#[from]` in its own error enum
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, CommonError>;

/// Failures raised by shared utilities.
///
/// ```
/// use sealrpc_common::error::CommonError;
///
/// let err = CommonError::invalid_input("method", "must contain a '.'");
/// assert!(err.is_invalid_input());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// A caller-supplied value was rejected.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Which value was rejected
        field: String,
        /// Rule it broke
        reason: String,
    },

    /// Unexpected condition inside the utility itself.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong
        message: String,
    },
}

impl CommonError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Checks if a caller-supplied value was rejected.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

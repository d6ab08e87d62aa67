// ============================================
// File: crates/sealrpc-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the identifiers that both ends of a connection must agree
//! on, so that a request built by the client and a registry entry on the
//! server are validated by the same rules.
//!
//! ## Main Functionality
//! - `CorrelationId`: Pairs a request with its response (8 bytes on the wire)
//! - `MethodName`: Validated `"Service.Method"` name
//!
//! ## ⚠️ Important Note for Next Developer
//! - Method names are case-sensitive; never normalise them
//! - `CorrelationId` values are only unique per connection
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a `CorrelationId` on the wire in bytes.
pub const CORRELATION_ID_SIZE: usize = 8;

/// Maximum encoded length of a method name in bytes.
pub const MAX_METHOD_NAME_LEN: usize = u16::MAX as usize;

// ============================================
// CorrelationId
// ============================================

/// Opaque token pairing a request with its response on one connection.
///
/// # Example
/// ```
/// use sealrpc_common::types::CorrelationId;
///
/// let id = CorrelationId::new(7);
/// assert_eq!(id.as_u64(), 7);
/// assert_eq!(id.next(), CorrelationId::new(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Creates a correlation id from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one, wrapping at `u64::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<CorrelationId> for u64 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

// ============================================
// MethodName
// ============================================

/// A validated `"Service.Method"` name.
///
/// # Rules
/// - exactly one `.` separating two non-empty parts
/// - no whitespace or control characters
/// - at most [`MAX_METHOD_NAME_LEN`] bytes
///
/// # Example
/// ```
/// use sealrpc_common::types::MethodName;
///
/// let name = MethodName::parse("Calc.Add").unwrap();
/// assert_eq!(name.service(), "Calc");
/// assert_eq!(name.method(), "Add");
///
/// assert!(MethodName::parse("Calc").is_err());
/// assert!(MethodName::parse("Calc.Add.More").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName {
    full: String,
    dot: usize,
}

impl MethodName {
    /// Validates and wraps a method name.
    ///
    /// # Errors
    /// Returns `CommonError::InvalidInput` if the name breaks any rule.
    pub fn parse(name: impl Into<String>) -> crate::Result<Self> {
        let full = name.into();

        if full.len() > MAX_METHOD_NAME_LEN {
            return Err(CommonError::invalid_input(
                "method",
                format!("name exceeds {MAX_METHOD_NAME_LEN} bytes"),
            ));
        }

        if full.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CommonError::invalid_input(
                "method",
                "name cannot contain whitespace or control characters",
            ));
        }

        let mut dots = full.match_indices('.');
        let dot = match (dots.next(), dots.next()) {
            (Some((idx, _)), None) => idx,
            _ => {
                return Err(CommonError::invalid_input(
                    "method",
                    format!("'{full}' must have the form Service.Method"),
                ))
            }
        };

        if dot == 0 || dot + 1 == full.len() {
            return Err(CommonError::invalid_input(
                "method",
                format!("'{full}' has an empty service or method part"),
            ));
        }

        Ok(Self { full, dot })
    }

    /// Returns the full `"Service.Method"` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Returns the service part.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.full[..self.dot]
    }

    /// Returns the method part.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.full[self.dot + 1..]
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for MethodName {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MethodName {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for MethodName {
    type Error = CommonError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MethodName> for String {
    fn from(name: MethodName) -> Self {
        name.full
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_wraps() {
        let id = CorrelationId::new(u64::MAX);
        assert_eq!(id.next(), CorrelationId::new(0));
        assert_eq!(id.to_string(), format!("#{}", u64::MAX));
    }

    #[test]
    fn test_method_name_parts() {
        let name: MethodName = "TestService.Add".parse().unwrap();
        assert_eq!(name.service(), "TestService");
        assert_eq!(name.method(), "Add");
        assert_eq!(name.as_str(), "TestService.Add");
    }

    #[test]
    fn test_method_name_is_case_sensitive() {
        let a = MethodName::parse("Calc.Add").unwrap();
        let b = MethodName::parse("calc.add").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_method_name_rejects_bad_shapes() {
        for bad in ["", "Calc", ".Add", "Calc.", "A.B.C", "Calc. Add", "Calc.Add\n"] {
            let err = MethodName::parse(bad).unwrap_err();
            assert!(err.is_invalid_input(), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_method_name_length_limit() {
        let long = format!("S.{}", "m".repeat(MAX_METHOD_NAME_LEN));
        assert!(MethodName::parse(long).is_err());
    }
}

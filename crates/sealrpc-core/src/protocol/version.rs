// ============================================
// File: crates/sealrpc-core/src/protocol/version.rs
// ============================================
//! # Wire Version Byte
//!
//! Every request and response carries the version of the framing that
//! produced it, right after the message type. Peers must agree exactly:
//! there is no negotiation and no downgrade path, so a frame with any
//! other value is a protocol error and the connection is dropped.
//!
//! | Byte | Layout |
//! |------|--------|
//! | 0x01 | `type version id:u64 len-prefixed name/error, len-prefixed payload` |
//!
//! ## Last Modified
//! v0.1.0 - Initial version definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Version byte written by this build.
pub const CURRENT_PROTOCOL_VERSION: u8 = 0x01;

/// A version byte read off the wire.
///
/// ```
/// use sealrpc_core::protocol::ProtocolVersion;
///
/// assert!(ProtocolVersion::check(0x01).is_ok());
/// assert!(ProtocolVersion::check(0x02).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(u8);

impl ProtocolVersion {
    /// The version this build speaks.
    pub const CURRENT: Self = Self(CURRENT_PROTOCOL_VERSION);

    /// Accepts `byte` only if it is the version this build speaks.
    ///
    /// # Errors
    /// Returns `UnsupportedVersion` for any other value.
    pub const fn check(byte: u8) -> Result<Self> {
        if byte == CURRENT_PROTOCOL_VERSION {
            Ok(Self(byte))
        } else {
            Err(CoreError::UnsupportedVersion {
                got: byte,
                expected: CURRENT_PROTOCOL_VERSION,
            })
        }
    }

    /// Returns the byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

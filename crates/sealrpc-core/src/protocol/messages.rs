// ============================================
// File: crates/sealrpc-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines the two messages that travel over an RPC connection.
//!
//! ## Main Functionality
//! - `MessageType`: Leading byte of every message body
//! - `Request`: Correlation id, method name, opaque payload
//! - `Response`: Correlation id, optional error, opaque payload
//!
//! ## Message Sizes
//! | Message | Fixed part (bytes) |
//! |---------|--------------------|
//! | Frame length prefix | 4 |
//! | Request header | 16 + method |
//! | Response header | 18 + error |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Field order is critical - DO NOT reorder without version bump
//! - A response with an error never carries a payload
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use sealrpc_common::types::{CorrelationId, CORRELATION_ID_SIZE};

// ============================================
// Constants
// ============================================

/// Size of the length prefix in front of every frame body.
pub const FRAME_LENGTH_SIZE: usize = 4;

/// Fixed part of a request body: type, version, id, method length, payload length.
pub const REQUEST_HEADER_SIZE: usize = 1 + 1 + CORRELATION_ID_SIZE + 2 + 4;

/// Fixed part of a response body: type, version, id, error length, payload length.
pub const RESPONSE_HEADER_SIZE: usize = 1 + 1 + CORRELATION_ID_SIZE + 4 + 4;

/// Default upper bound on a frame body (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

// ============================================
// MessageType
// ============================================

/// Protocol message type identifier.
///
/// # Values
/// | Value | Type |
/// |-------|------|
/// | 0x01 | Request |
/// | 0x02 | Response |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Method invocation sent by the client.
    Request = 0x01,
    /// Result sent back by the server.
    Response = 0x02,
}

impl MessageType {
    /// Converts a byte to a `MessageType`.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Request),
            0x02 => Some(Self::Response),
            _ => None,
        }
    }

    /// Converts the `MessageType` to its byte representation.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(value)
    }
}

// ============================================
// Request
// ============================================

/// A method invocation.
///
/// # Wire Format
/// ```text
/// ┌────────────────────────────────────────────┐
/// │ message_type (1 byte)         │ 0x01       │
/// ├────────────────────────────────────────────┤
/// │ version (1 byte)              │ Protocol   │
/// ├────────────────────────────────────────────┤
/// │ id (8 bytes)                  │ u64 LE     │
/// ├────────────────────────────────────────────┤
/// │ method_len (2 bytes)          │ u16 LE     │
/// ├────────────────────────────────────────────┤
/// │ method (method_len bytes)     │ UTF-8      │
/// ├────────────────────────────────────────────┤
/// │ payload_len (4 bytes)         │ u32 LE     │
/// ├────────────────────────────────────────────┤
/// │ payload (payload_len bytes)   │ opaque     │
/// └────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Correlation id chosen by the client.
    pub id: CorrelationId,
    /// Target `"Service.Method"` name.
    pub method: String,
    /// Caller-supplied argument bytes.
    pub payload: Bytes,
}

impl Request {
    /// Creates a new request.
    #[must_use]
    pub fn new(id: CorrelationId, method: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            method: method.into(),
            payload: payload.into(),
        }
    }

    /// Returns the encoded body size of this request.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        REQUEST_HEADER_SIZE + self.method.len() + self.payload.len()
    }
}

// ============================================
// Response
// ============================================

/// The result of one request.
///
/// # Wire Format
/// ```text
/// ┌────────────────────────────────────────────┐
/// │ message_type (1 byte)         │ 0x02       │
/// ├────────────────────────────────────────────┤
/// │ version (1 byte)              │ Protocol   │
/// ├────────────────────────────────────────────┤
/// │ id (8 bytes)                  │ u64 LE     │
/// ├────────────────────────────────────────────┤
/// │ error_len (4 bytes)           │ 0 = ok     │
/// ├────────────────────────────────────────────┤
/// │ error (error_len bytes)       │ UTF-8      │
/// ├────────────────────────────────────────────┤
/// │ payload_len (4 bytes)         │ u32 LE     │
/// ├────────────────────────────────────────────┤
/// │ payload (payload_len bytes)   │ opaque     │
/// └────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Correlation id copied from the request.
    pub id: CorrelationId,
    /// Remote error, if the call failed.
    pub error: Option<String>,
    /// Reply bytes; empty when `error` is set.
    pub payload: Bytes,
}

impl Response {
    /// Creates a successful response.
    #[must_use]
    pub fn success(id: CorrelationId, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            error: None,
            payload: payload.into(),
        }
    }

    /// Creates a failed response.
    ///
    /// An empty message is replaced so the failure stays visible on the wire.
    #[must_use]
    pub fn failure(id: CorrelationId, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message.push_str("unknown error");
        }
        Self {
            id,
            error: Some(message),
            payload: Bytes::new(),
        }
    }

    /// Returns `true` if this response reports a remote failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Converts into the reply bytes or the remote error message.
    ///
    /// # Errors
    /// Returns the remote error string if the call failed.
    pub fn into_result(self) -> Result<Bytes, String> {
        match self.error {
            Some(message) => Err(message),
            None => Ok(self.payload),
        }
    }

    /// Returns the encoded body size of this response.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        RESPONSE_HEADER_SIZE
            + self.error.as_ref().map_or(0, String::len)
            + self.payload.len()
    }
}

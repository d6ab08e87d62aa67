// ============================================
// File: crates/sealrpc-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Provides binary serialization and deserialization for RPC messages.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface for frame bodies
//! - `ProtocolCodec`: Implementation for `Request` and `Response`
//! - `encode_frame`: Body plus length prefix, ready for one `write_all`
//! - `frame_body_len`: Validates a received length prefix
//!
//! ## Parsing Strategy
//! 1. Check minimum body length
//! 2. Read and check message type and version bytes
//! 3. Read each length field and check the remaining buffer before slicing
//! 4. Reject trailing bytes
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always validate buffer lengths before reading
//! - Payloads are sliced out of the input `Bytes` without copying
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sealrpc_common::types::{CorrelationId, MAX_METHOD_NAME_LEN};

use crate::error::{CoreError, Result};
use crate::protocol::messages::{
    MessageType, Request, Response, DEFAULT_MAX_FRAME_SIZE, FRAME_LENGTH_SIZE,
    REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE,
};
use crate::protocol::version::ProtocolVersion;

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding frame bodies.
///
/// # Type Parameters
/// * `T` - The message type to encode/decode
pub trait Codec<T> {
    /// Encodes a message body (without length prefix) into `buf`.
    ///
    /// # Errors
    /// Returns an error if the message cannot be represented on the wire.
    fn encode(&self, msg: &T, buf: &mut BytesMut) -> Result<()>;

    /// Decodes a complete message body.
    ///
    /// # Errors
    /// Returns a protocol error if the body is malformed.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// ProtocolCodec
// ============================================

/// Codec implementation for all protocol messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolCodec {
    max_frame_size: usize,
}

impl ProtocolCodec {
    /// Creates a codec with the default frame size limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the maximum accepted frame body size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Returns the maximum accepted frame body size.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Identifies the message type from a body without consuming it.
    ///
    /// # Errors
    /// Returns an error if the body is empty or the type byte is unknown.
    pub fn peek_message_type(buf: &[u8]) -> Result<MessageType> {
        let Some(&first) = buf.first() else {
            return Err(CoreError::too_short(1, 0));
        };
        MessageType::from_byte(first).ok_or(CoreError::UnknownMessageType(first))
    }

    /// Validates a received length prefix and returns the body length.
    ///
    /// # Errors
    /// Returns `MessageTooLarge` if the body would exceed the limit, or
    /// `MalformedMessage` for an empty body.
    pub fn frame_body_len(&self, header: [u8; FRAME_LENGTH_SIZE]) -> Result<usize> {
        let len = u32::from_le_bytes(header) as usize;
        if len == 0 {
            return Err(CoreError::malformed("empty frame"));
        }
        if len > self.max_frame_size {
            return Err(CoreError::too_large(self.max_frame_size, len));
        }
        Ok(len)
    }

    /// Encodes a message as a complete frame (length prefix + body).
    ///
    /// # Errors
    /// Returns an error if the body cannot be encoded or exceeds the limit.
    pub fn encode_frame<T>(&self, msg: &T) -> Result<BytesMut>
    where
        Self: Codec<T>,
    {
        let mut buf = BytesMut::with_capacity(FRAME_LENGTH_SIZE + 64);
        buf.put_u32_le(0);
        self.encode(msg, &mut buf)?;

        let body_len = buf.len() - FRAME_LENGTH_SIZE;
        if body_len > self.max_frame_size {
            return Err(CoreError::too_large(self.max_frame_size, body_len));
        }
        let prefix = u32::try_from(body_len)
            .map_err(|_| CoreError::too_large(u32::MAX as usize, body_len))?;
        buf[..FRAME_LENGTH_SIZE].copy_from_slice(&prefix.to_le_bytes());

        Ok(buf)
    }

    fn expect_header(buf: &mut Bytes, expected: MessageType) -> Result<()> {
        let message_type = Self::peek_message_type(buf)?;
        if message_type != expected {
            return Err(CoreError::malformed(format!(
                "Expected {:?} (0x{:02x}), got {:?}",
                expected,
                expected.as_byte(),
                message_type
            )));
        }
        buf.advance(1);

        ProtocolVersion::check(buf.get_u8())?;
        Ok(())
    }

    fn take_utf8(buf: &mut Bytes, len: usize, field: &str) -> Result<String> {
        let raw = buf.split_to(len);
        String::from_utf8(raw.to_vec())
            .map_err(|_| CoreError::malformed(format!("{field} is not valid UTF-8")))
    }

    fn take_payload(buf: &mut Bytes, consumed: usize) -> Result<Bytes> {
        if buf.len() < 4 {
            return Err(CoreError::too_short(consumed + 4, consumed + buf.len()));
        }
        let payload_len = buf.get_u32_le() as usize;
        let consumed = consumed + 4;

        if buf.len() < payload_len {
            return Err(CoreError::too_short(
                consumed + payload_len,
                consumed + buf.len(),
            ));
        }
        if buf.len() > payload_len {
            return Err(CoreError::malformed(format!(
                "{} trailing bytes after payload",
                buf.len() - payload_len
            )));
        }
        Ok(buf.split_to(payload_len))
    }
}

impl Default for ProtocolCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Request Codec
// ============================================

impl Codec<Request> for ProtocolCodec {
    fn encode(&self, msg: &Request, buf: &mut BytesMut) -> Result<()> {
        if msg.method.is_empty() {
            return Err(CoreError::malformed("method name cannot be empty"));
        }
        let method_len = u16::try_from(msg.method.len())
            .map_err(|_| CoreError::too_large(MAX_METHOD_NAME_LEN, msg.method.len()))?;
        let payload_len = u32::try_from(msg.payload.len())
            .map_err(|_| CoreError::too_large(self.max_frame_size, msg.payload.len()))?;

        buf.reserve(msg.wire_size());
        buf.put_u8(MessageType::Request.as_byte());
        buf.put_u8(ProtocolVersion::CURRENT.as_u8());
        buf.put_u64_le(msg.id.as_u64());
        buf.put_u16_le(method_len);
        buf.put_slice(msg.method.as_bytes());
        buf.put_u32_le(payload_len);
        buf.put_slice(&msg.payload);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Request> {
        if buf.len() < REQUEST_HEADER_SIZE {
            return Err(CoreError::too_short(REQUEST_HEADER_SIZE, buf.len()));
        }
        let total = buf.len();

        Self::expect_header(buf, MessageType::Request)?;
        let id = CorrelationId::new(buf.get_u64_le());

        let method_len = buf.get_u16_le() as usize;
        if method_len == 0 {
            return Err(CoreError::malformed("method name cannot be empty"));
        }
        if buf.len() < method_len {
            return Err(CoreError::too_short(
                REQUEST_HEADER_SIZE + method_len,
                total,
            ));
        }
        let method = Self::take_utf8(buf, method_len, "method name")?;

        let consumed = total - buf.len();
        let payload = Self::take_payload(buf, consumed)?;

        Ok(Request { id, method, payload })
    }
}

// ============================================
// Response Codec
// ============================================

impl Codec<Response> for ProtocolCodec {
    fn encode(&self, msg: &Response, buf: &mut BytesMut) -> Result<()> {
        let error = msg.error.as_deref().unwrap_or_default();
        if !error.is_empty() && !msg.payload.is_empty() {
            return Err(CoreError::malformed("error response cannot carry a payload"));
        }
        let error_len = u32::try_from(error.len())
            .map_err(|_| CoreError::too_large(self.max_frame_size, error.len()))?;
        let payload_len = u32::try_from(msg.payload.len())
            .map_err(|_| CoreError::too_large(self.max_frame_size, msg.payload.len()))?;

        buf.reserve(msg.wire_size());
        buf.put_u8(MessageType::Response.as_byte());
        buf.put_u8(ProtocolVersion::CURRENT.as_u8());
        buf.put_u64_le(msg.id.as_u64());
        buf.put_u32_le(error_len);
        buf.put_slice(error.as_bytes());
        buf.put_u32_le(payload_len);
        buf.put_slice(&msg.payload);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Response> {
        if buf.len() < RESPONSE_HEADER_SIZE {
            return Err(CoreError::too_short(RESPONSE_HEADER_SIZE, buf.len()));
        }
        let total = buf.len();

        Self::expect_header(buf, MessageType::Response)?;
        let id = CorrelationId::new(buf.get_u64_le());

        let error_len = buf.get_u32_le() as usize;
        if buf.len() < error_len {
            return Err(CoreError::too_short(
                RESPONSE_HEADER_SIZE.saturating_add(error_len),
                total,
            ));
        }
        let error = if error_len == 0 {
            None
        } else {
            Some(Self::take_utf8(buf, error_len, "error message")?)
        };

        let consumed = total - buf.len();
        let payload = Self::take_payload(buf, consumed)?;

        if error.is_some() && !payload.is_empty() {
            return Err(CoreError::malformed("error response carries a payload"));
        }

        Ok(Response { id, error, payload })
    }
}

// ============================================
// Tests
// ============================================

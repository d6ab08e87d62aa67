// ============================================
// File: crates/sealrpc-transport/src/frame.rs
// ============================================
//! # Frame I/O
//!
//! ## Creation Reason
//! Moves whole frames across a byte stream. A frame is a `u32`
//! little-endian length followed by that many body bytes.
//!
//! ## Main Functionality
//! - `read_frame`: reads exactly one frame body, or reports a clean EOF
//! - `write_frame`: writes one pre-encoded frame and flushes
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never hand a partially read body to the codec
//! - The length prefix is checked against the limit BEFORE allocating
//!
//! ## Last Modified
//! v0.1.0 - Initial frame I/O

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use sealrpc_core::error::CoreError;
use sealrpc_core::protocol::messages::FRAME_LENGTH_SIZE;
use sealrpc_core::ProtocolCodec;

use crate::error::{Result, TransportError};

/// Reads one frame body from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly at a frame boundary.
///
/// # Errors
/// - `TruncatedFrame` if the stream ends inside a frame
/// - `FrameTooLarge` if the announced length exceeds the codec limit
/// - `Io` for any other read failure
pub async fn read_frame<R>(reader: &mut R, codec: &ProtocolCodec) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; FRAME_LENGTH_SIZE];
    let mut filled = 0;

    while filled < FRAME_LENGTH_SIZE {
        let n = match reader.read(&mut header[filled..]).await {
            Ok(n) => n,
            // TLS peers that skip close_notify surface as UnexpectedEof.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && filled == 0 => return Ok(None),
            Err(e) => return Err(TransportError::io("reading frame header", e)),
        };
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(TransportError::TruncatedFrame {
                expected: FRAME_LENGTH_SIZE,
                received: filled,
            });
        }
        filled += n;
    }

    let len = codec.frame_body_len(header).map_err(|e| match e {
        CoreError::MessageTooLarge { max, actual } => TransportError::FrameTooLarge { max, actual },
        other => TransportError::Core(other),
    })?;

    let mut body = BytesMut::zeroed(len);
    let mut filled = 0;
    while filled < len {
        let n = match reader.read(&mut body[filled..]).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(TransportError::io("reading frame body", e)),
        };
        if n == 0 {
            return Err(TransportError::TruncatedFrame {
                expected: len,
                received: filled,
            });
        }
        filled += n;
    }

    trace!(len, "Frame read");
    Ok(Some(body.freeze()))
}

/// Writes one complete frame (prefix included) and flushes it.
///
/// # Errors
/// Returns `Io` if the write or flush fails.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer
        .write_all(frame)
        .await
        .map_err(|e| TransportError::io("writing frame", e))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::io("flushing frame", e))?;

    trace!(len = frame.len(), "Frame written");
    Ok(())
}

// ============================================
// Tests
// ============================================

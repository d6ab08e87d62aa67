// ============================================
// File: crates/sealrpc-server/src/handlers/connection.rs
// ============================================
//! # Connection Handler
//!
//! ## Creation Reason
//! Serves one established connection: reads requests, dispatches them to
//! registered handlers and writes back exactly one response per request.
//!
//! ## Main Functionality
//! - `ConnectionHandler`: per-connection request loop
//! - `ConnectionOutcome`: why the loop ended and in which `ConnectionState`
//!
//! ## Request Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Reading ──► Dispatching ──► Writing ──┐                    │
//! │     ▲                                  │                    │
//! │     └──────────────────────────────────┘                    │
//! │                                                             │
//! │  Reading:     EOF at boundary          → Closed(PeerClosed) │
//! │               read error               → Closed(Transport)  │
//! │               bad / short / huge frame → Closed(Protocol)   │
//! │  Dispatching: unknown method  → error response              │
//! │               handler Err     → error response              │
//! │               handler panic   → "handler fault: ..."        │
//! │               task cancelled  → Closed(HandlerCancelled)    │
//! │  Writing:     write error              → Closed(Transport)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers run on the blocking pool and never see the stream
//! - A handler panic keeps the connection open; the stream was never shared
//! - Log suspicious activity (bad frames) at warn, but never payload bytes
//!
//! ## Last Modified
//! v0.1.0 - Initial connection handler

use std::any::Any;
use std::fmt;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use sealrpc_core::protocol::{Codec, ProtocolCodec, Request, Response};
use sealrpc_transport::{read_frame, write_frame, RpcStream};

use crate::registry::RegistrySnapshot;

// ============================================
// State and Outcome
// ============================================

/// Phase of the request loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the next request frame.
    Reading,
    /// Running the handler for the current request.
    Dispatching,
    /// Sending the response for the current request.
    Writing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reading => "reading",
            Self::Dispatching => "dispatching",
            Self::Writing => "writing",
        })
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the stream between frames.
    PeerClosed,
    /// Reading or writing the stream failed.
    Transport(String),
    /// The peer sent bytes that break the protocol.
    Protocol(String),
    /// A handler task was cancelled before producing a result.
    HandlerCancelled,
}

impl CloseReason {
    /// Returns `true` for a normal, peer-initiated close.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::PeerClosed)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("peer closed"),
            Self::Transport(reason) => write!(f, "transport error: {reason}"),
            Self::Protocol(reason) => write!(f, "protocol error: {reason}"),
            Self::HandlerCancelled => f.write_str("handler cancelled"),
        }
    }
}

/// Summary returned when a connection ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    /// Responses successfully written.
    pub requests_served: u64,
    /// Why the loop ended.
    pub reason: CloseReason,
    /// Phase the loop was in when it stopped.
    pub ended_in: ConnectionState,
}

// ============================================
// ConnectionHandler
// ============================================

/// Runs the request loop for one connection.
///
/// # Thread Safety
/// Owned by exactly one task; nothing here is shared.
pub struct ConnectionHandler<S> {
    stream: S,
    peer: SocketAddr,
    registry: RegistrySnapshot,
    codec: ProtocolCodec,
    state: ConnectionState,
    requests_served: u64,
}

impl<S: RpcStream> ConnectionHandler<S> {
    /// Creates a handler for an established stream.
    pub fn new(
        stream: S,
        peer: SocketAddr,
        registry: RegistrySnapshot,
        codec: ProtocolCodec,
    ) -> Self {
        Self {
            stream,
            peer,
            registry,
            codec,
            state: ConnectionState::Reading,
            requests_served: 0,
        }
    }

    /// Serves requests until the connection ends.
    pub async fn run(mut self) -> ConnectionOutcome {
        let reason = loop {
            match self.serve_one().await {
                Ok(()) => self.requests_served += 1,
                Err(reason) => break reason,
            }
        };

        if let Err(e) = self.stream.shutdown().await {
            trace!(peer = %self.peer, error = %e, "Stream shutdown failed");
        }

        ConnectionOutcome {
            requests_served: self.requests_served,
            reason,
            ended_in: self.state,
        }
    }

    /// Reads one request and writes its response.
    async fn serve_one(&mut self) -> Result<(), CloseReason> {
        self.state = ConnectionState::Reading;
        let mut body = match read_frame(&mut self.stream, &self.codec).await {
            Ok(Some(body)) => body,
            Ok(None) => return Err(CloseReason::PeerClosed),
            Err(e) if e.is_protocol_violation() => {
                warn!(peer = %self.peer, error = %e, "Invalid frame, closing connection");
                return Err(CloseReason::Protocol(e.to_string()));
            }
            Err(e) => return Err(CloseReason::Transport(e.to_string())),
        };

        let request: Request = self.codec.decode(&mut body).map_err(|e| {
            warn!(peer = %self.peer, error = %e, "Undecodable request, closing connection");
            CloseReason::Protocol(e.to_string())
        })?;

        debug!(
            peer = %self.peer,
            id = %request.id,
            method = %request.method,
            "Request received"
        );
        trace!(id = %request.id, args_len = request.payload.len(), "Request payload");

        self.state = ConnectionState::Dispatching;
        let response = Self::dispatch(&self.registry, self.peer, request).await?;

        self.state = ConnectionState::Writing;
        let frame = self.encode_response(response)?;
        write_frame(&mut self.stream, &frame)
            .await
            .map_err(|e| CloseReason::Transport(e.to_string()))
    }

    /// Produces the response for one request.
    async fn dispatch(
        registry: &RegistrySnapshot,
        peer: SocketAddr,
        request: Request,
    ) -> Result<Response, CloseReason> {
        let Request {
            id,
            method,
            payload,
        } = request;

        let handler = match registry.lookup(&method) {
            Ok(handler) => handler,
            Err(e) => {
                debug!(peer = %peer, id = %id, method = %method, "Unknown method");
                return Ok(Response::failure(id, e.to_string()));
            }
        };

        match tokio::task::spawn_blocking(move || handler.call(payload)).await {
            Ok(Ok(reply)) => Ok(Response::success(id, reply)),
            Ok(Err(e)) => {
                debug!(peer = %peer, id = %id, method = %method, error = %e, "Handler returned error");
                Ok(Response::failure(id, format!("{e:#}")))
            }
            Err(join) if join.is_panic() => {
                let message = panic_message(&*join.into_panic());
                warn!(
                    peer = %peer,
                    id = %id,
                    method = %method,
                    panic = %message,
                    "Handler panicked"
                );
                Ok(Response::failure(id, format!("handler fault: {message}")))
            }
            Err(_) => {
                warn!(peer = %peer, id = %id, method = %method, "Handler task cancelled");
                Err(CloseReason::HandlerCancelled)
            }
        }
    }

    /// Encodes a response, replacing an unencodable reply with an error.
    fn encode_response(&self, response: Response) -> Result<BytesMut, CloseReason> {
        match self.codec.encode_frame(&response) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!(peer = %self.peer, id = %response.id, error = %e, "Reply cannot be sent");
                let fallback = Response::failure(response.id, format!("reply rejected: {e}"));
                self.codec
                    .encode_frame(&fallback)
                    .map_err(|e| CloseReason::Protocol(e.to_string()))
            }
        }
    }
}

impl<S> fmt::Debug for ConnectionHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("peer", &self.peer)
            .field("state", &self.state)
            .field("requests_served", &self.requests_served)
            .finish_non_exhaustive()
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    use sealrpc_common::types::CorrelationId;

    use crate::registry::MethodRegistry;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn registry() -> MethodRegistry {
        let registry = MethodRegistry::new();
        registry
            .register("Diagnostics.Echo", |args: Bytes| Ok(args.to_vec()))
            .unwrap();
        registry
            .register("Faulty.Panic", |_args: Bytes| -> anyhow::Result<Vec<u8>> {
                panic!("boom")
            })
            .unwrap();
        registry
            .register("Faulty.Fail", |_args: Bytes| -> anyhow::Result<Vec<u8>> {
                anyhow::bail!("division by zero")
            })
            .unwrap();
        registry
    }

    fn spawn_handler(
        registry: &MethodRegistry,
        codec: ProtocolCodec,
    ) -> (DuplexStream, JoinHandle<ConnectionOutcome>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let handler = ConnectionHandler::new(server, peer(), registry.snapshot(), codec);
        (client, tokio::spawn(handler.run()))
    }

    async fn call(client: &mut DuplexStream, id: u64, method: &str, args: &[u8]) -> Response {
        let codec = ProtocolCodec::new();
        let request = Request::new(CorrelationId::new(id), method, args.to_vec());
        write_frame(client, &codec.encode_frame(&request).unwrap())
            .await
            .unwrap();
        let mut body = read_frame(client, &codec).await.unwrap().unwrap();
        codec.decode(&mut body).unwrap()
    }

    #[tokio::test]
    async fn test_echo_then_peer_close() {
        let registry = registry();
        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());

        let response = call(&mut client, 1, "Diagnostics.Echo", b"\x00\x01payload").await;
        assert_eq!(response.id, CorrelationId::new(1));
        assert_eq!(response.into_result().unwrap(), Bytes::from_static(b"\x00\x01payload"));

        drop(client);
        let outcome = task.await.unwrap();
        assert_eq!(outcome.requests_served, 1);
        assert_eq!(outcome.reason, CloseReason::PeerClosed);
        assert!(outcome.reason.is_clean());
        assert_eq!(outcome.ended_in, ConnectionState::Reading);
    }

    #[tokio::test]
    async fn test_unknown_method_keeps_connection() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let registry = registry();
        let counter = Arc::clone(&invoked);
        registry
            .register("Counter.Hit", move |_args: Bytes| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .unwrap();

        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());

        let response = call(&mut client, 7, "Calc.Sub", b"").await;
        assert_eq!(
            response.error.as_deref(),
            Some("rpc: can't find method Calc.Sub")
        );
        assert_eq!(invoked.load(Ordering::SeqCst), 0);

        let response = call(&mut client, 8, "Diagnostics.Echo", b"still here").await;
        assert_eq!(response.into_result().unwrap(), Bytes::from_static(b"still here"));

        drop(client);
        assert_eq!(task.await.unwrap().requests_served, 2);
    }

    #[tokio::test]
    async fn test_handler_error_and_panic() {
        let registry = registry();
        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());

        let response = call(&mut client, 1, "Faulty.Fail", b"").await;
        assert_eq!(response.error.as_deref(), Some("division by zero"));

        let response = call(&mut client, 2, "Faulty.Panic", b"").await;
        assert_eq!(response.error.as_deref(), Some("handler fault: boom"));
        assert!(response.payload.is_empty());

        let response = call(&mut client, 3, "Diagnostics.Echo", b"after").await;
        assert!(!response.is_error());

        drop(client);
        let outcome = task.await.unwrap();
        assert_eq!(outcome.requests_served, 3);
    }

    #[tokio::test]
    async fn test_pipelined_requests_answered_in_order() {
        let registry = registry();
        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());
        let codec = ProtocolCodec::new();

        for id in 10..13u64 {
            let request = Request::new(CorrelationId::new(id), "Diagnostics.Echo", id.to_le_bytes().to_vec());
            write_frame(&mut client, &codec.encode_frame(&request).unwrap())
                .await
                .unwrap();
        }
        for id in 10..13u64 {
            let mut body = read_frame(&mut client, &codec).await.unwrap().unwrap();
            let response: Response = codec.decode(&mut body).unwrap();
            assert_eq!(response.id, CorrelationId::new(id));
            assert_eq!(&response.payload[..], &id.to_le_bytes());
        }

        drop(client);
        assert_eq!(task.await.unwrap().requests_served, 3);
    }

    #[tokio::test]
    async fn test_garbage_frame_is_protocol_error() {
        let registry = registry();
        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());

        let mut frame = 20u32.to_le_bytes().to_vec();
        frame.extend_from_slice(&[0xEE; 20]);
        client.write_all(&frame).await.unwrap();

        let outcome = task.await.unwrap();
        assert!(matches!(outcome.reason, CloseReason::Protocol(_)));
        assert_eq!(outcome.requests_served, 0);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_protocol_error() {
        let registry = registry();
        let codec = ProtocolCodec::new().with_max_frame_size(128);
        let (mut client, task) = spawn_handler(&registry, codec);

        client.write_all(&4096u32.to_le_bytes()).await.unwrap();

        let outcome = task.await.unwrap();
        assert!(matches!(outcome.reason, CloseReason::Protocol(_)));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_protocol_error() {
        let registry = registry();
        let (mut client, task) = spawn_handler(&registry, ProtocolCodec::new());

        client.write_all(&64u32.to_le_bytes()).await.unwrap();
        client.write_all(&[0x01, 0x01, 0x00]).await.unwrap();
        drop(client);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome.reason, CloseReason::Protocol(_)));
    }

    #[tokio::test]
    async fn test_oversized_reply_becomes_error_response() {
        let registry = MethodRegistry::new();
        registry
            .register("Bulk.Fetch", |_args: Bytes| Ok(vec![0u8; 4096]))
            .unwrap();
        let codec = ProtocolCodec::new().with_max_frame_size(1024);
        let (mut client, task) = spawn_handler(&registry, codec);

        let response = call(&mut client, 1, "Bulk.Fetch", b"").await;
        assert!(response.error.unwrap().starts_with("reply rejected"));

        drop(client);
        assert_eq!(task.await.unwrap().requests_served, 1);
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::PeerClosed.to_string(), "peer closed");
        assert!(CloseReason::Protocol("bad".into()).to_string().contains("bad"));
        assert!(!CloseReason::HandlerCancelled.is_clean());
        assert_eq!(ConnectionState::Writing.to_string(), "writing");
    }
}

// ============================================
// File: crates/sealrpc-client/src/client.rs
// ============================================
//! # RPC Client
//!
//! ## Creation Reason
//! Gives applications a handle for calling named methods on a remote
//! server over one authenticated TLS connection.
//!
//! ## Main Functionality
//! - `RpcClient::connect`: dial + TLS handshake against trust anchors
//! - `RpcClient::call`: one request, one correlated response
//! - Concurrent calls multiplexed over the same connection
//! - `RpcClient::close`: fail pending calls and send close_notify
//!
//! ## Connection Tasks
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  call() ──► pending.insert(id, oneshot) ──► outbound mpsc   │
//! │                                                  │          │
//! │                                                  ▼          │
//! │                                     Writer task: write_frame│
//! │                                                  │          │
//! │                         TLS stream (split in two halves)    │
//! │                                                  │          │
//! │  oneshot ◄── pending.remove(id) ◄── Reader task: read_frame │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A response for an id that is neither pending nor abandoned tears the
//!   connection down; that covers a second reply to an answered call
//! - There are no timeouts; wrap `call` in `tokio::time::timeout`
//! - Teardown closes the flag before draining `pending`; `call` inserts
//!   before checking the flag. Keep that order.
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::{Bytes, BytesMut};
use dashmap::{DashMap, DashSet};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use sealrpc_common::types::{CorrelationId, MAX_METHOD_NAME_LEN};
use sealrpc_core::credentials::TrustAnchors;
use sealrpc_core::protocol::messages::DEFAULT_MAX_FRAME_SIZE;
use sealrpc_core::protocol::{Codec, ProtocolCodec, Request, Response};
use sealrpc_transport::{dial, read_frame, server_name_for, write_frame, ClientStream};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Frames queued for the writer before `call` waits for capacity.
const OUTBOUND_QUEUE: usize = 64;

// ============================================
// ClientOptions
// ============================================

/// Connection options for [`RpcClient::connect_with`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Name used in log lines only.
    pub display_name: String,
    /// TLS server name; `None` uses the host part of the address.
    pub server_name: Option<String>,
    /// Maximum frame body size in bytes, both directions.
    pub max_frame_size: usize,
}

impl ClientOptions {
    /// Creates options with the given display name and defaults otherwise.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            server_name: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the TLS server name.
    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Sets the frame size limit.
    #[must_use]
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

// ============================================
// Teardown
// ============================================

/// Why the connection stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Teardown {
    Closed,
    Transport(String),
    Protocol(String),
}

impl From<Teardown> for ClientError {
    fn from(reason: Teardown) -> Self {
        match reason {
            Teardown::Closed => Self::Closed,
            Teardown::Transport(msg) => Self::Transport(msg),
            Teardown::Protocol(msg) => Self::Protocol(msg),
        }
    }
}

type Reply = std::result::Result<Response, Teardown>;

/// State shared by the handle and both connection tasks.
struct Shared {
    name: String,
    peer: SocketAddr,
    pending: DashMap<u64, oneshot::Sender<Reply>>,
    /// Ids whose caller gave up before the reply arrived.
    abandoned: DashSet<u64>,
    next_id: AtomicU64,
    closed: AtomicBool,
    reason: OnceLock<Teardown>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Shared {
    /// Marks the connection dead and fails every pending call.
    fn teardown(&self, reason: Teardown) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            match &reason {
                Teardown::Closed => info!(client = %self.name, peer = %self.peer, "Client closed"),
                Teardown::Transport(msg) => {
                    warn!(client = %self.name, peer = %self.peer, error = %msg, "Connection lost");
                }
                Teardown::Protocol(msg) => {
                    warn!(client = %self.name, peer = %self.peer, error = %msg, "Protocol violation, closing");
                }
            }
            let _ = self.reason.set(reason);
            let _ = self.shutdown_tx.send(());
        }

        let reason = self.failure();
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, tx)) = self.pending.remove(&id) {
                let _ = tx.send(Err(reason.clone()));
            }
        }
    }

    fn failure(&self) -> Teardown {
        self.reason.get().cloned().unwrap_or(Teardown::Closed)
    }

}

/// Removes a pending entry if its call is dropped before a reply.
///
/// An id still waiting at that point moves to `abandoned`, so exactly one
/// late reply for it is accepted.
struct PendingSlot<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.shared.pending.remove(&self.id).is_some()
            && !self.shared.closed.load(Ordering::SeqCst)
        {
            self.shared.abandoned.insert(self.id);
        }
    }
}

// ============================================
// RpcClient
// ============================================

/// Handle to one TLS connection to an RPC server.
///
/// `call` takes `&self`; share the client behind an `Arc` to issue calls
/// from several tasks at once.
pub struct RpcClient {
    shared: Arc<Shared>,
    outbound: mpsc::Sender<BytesMut>,
    codec: ProtocolCodec,
}

impl RpcClient {
    /// Connects to `address`, using its host part as the TLS server name.
    ///
    /// # Errors
    /// Returns `Dial` if the server is unreachable or its certificate does
    /// not chain to `trust`.
    pub async fn connect(
        trust: &TrustAnchors,
        address: &str,
        display_name: impl Into<String>,
    ) -> Result<Self> {
        Self::connect_with(trust, address, ClientOptions::new(display_name)).await
    }

    /// Connects with explicit options.
    ///
    /// # Errors
    /// Returns `Dial` on any connect or handshake failure. Never retries.
    pub async fn connect_with(
        trust: &TrustAnchors,
        address: &str,
        options: ClientOptions,
    ) -> Result<Self> {
        let server_name = match options.server_name {
            Some(name) => name,
            None => server_name_for(address).map_err(|e| ClientError::dial(address, e))?,
        };

        let (stream, peer) = dial(trust, address, &server_name)
            .await
            .map_err(|e| ClientError::dial(address, e))?;

        info!(
            client = %options.display_name,
            peer = %peer.addr,
            server_name = %server_name,
            "Connected"
        );

        Ok(Self::spawn(
            stream,
            peer.addr,
            options.display_name,
            ProtocolCodec::new().with_max_frame_size(options.max_frame_size),
        ))
    }

    /// Loads trust anchors named by `config` and connects.
    ///
    /// # Errors
    /// Trust loading failures are config errors; dial failures as for
    /// `connect`.
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let trust = TrustAnchors::load(&config.tls.trust_file)?;
        let mut options = ClientOptions::new(config.client.display_name.clone())
            .with_max_frame_size(config.limits.max_frame_size);
        options.server_name.clone_from(&config.server.server_name);

        Self::connect_with(&trust, &config.server.address, options).await
    }

    /// Splits the stream and starts the reader and writer tasks.
    fn spawn(stream: ClientStream, peer: SocketAddr, name: String, codec: ProtocolCodec) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let shared = Arc::new(Shared {
            name,
            peer,
            pending: DashMap::new(),
            abandoned: DashSet::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            reason: OnceLock::new(),
            shutdown_tx,
        });

        let (reader, writer) = tokio::io::split(stream);
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);

        tokio::spawn(read_loop(
            reader,
            codec,
            Arc::clone(&shared),
            shared.shutdown_tx.subscribe(),
        ));
        tokio::spawn(write_loop(
            writer,
            outbound_rx,
            Arc::clone(&shared),
            shared.shutdown_tx.subscribe(),
        ));

        Self {
            shared,
            outbound,
            codec,
        }
    }

    /// Calls `method` with `args` and waits for the reply.
    ///
    /// # Errors
    /// - `InvalidMethod` if `method` is empty or too long to encode
    /// - `Remote` if the server's handler returned an error
    /// - `Closed`, `Transport` or `Protocol` if the connection stopped
    pub async fn call(&self, method: &str, args: impl Into<Bytes>) -> Result<Bytes> {
        // Anything encodable goes to the server, which owns name lookup.
        if method.is_empty() || method.len() > MAX_METHOD_NAME_LEN {
            return Err(ClientError::InvalidMethod {
                name: method.to_string(),
                reason: format!("must be 1 to {MAX_METHOD_NAME_LEN} bytes"),
            });
        }

        if self.is_closed() {
            return Err(self.shared.failure().into());
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let request = Request::new(CorrelationId::new(id), method, args);
        let frame = self
            .codec
            .encode_frame(&request)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);
        let _slot = PendingSlot {
            shared: &self.shared,
            id,
        };

        if self.shared.closed.load(Ordering::SeqCst)
            && self.shared.pending.remove(&id).is_some()
        {
            return Err(self.shared.failure().into());
        }

        debug!(client = %self.shared.name, id = %request.id, method = %method, "Calling");
        trace!(id = %request.id, args_len = request.payload.len(), "Request payload");

        if self.outbound.send(frame).await.is_err() && self.shared.pending.remove(&id).is_some() {
            return Err(self.shared.failure().into());
        }

        match rx.await {
            Ok(Ok(response)) => {
                trace!(id = %response.id, reply_len = response.payload.len(), "Response received");
                response.into_result().map_err(|message| ClientError::Remote {
                    method: method.to_string(),
                    message,
                })
            }
            Ok(Err(reason)) => Err(reason.into()),
            Err(_) => Err(self.shared.failure().into()),
        }
    }

    /// Closes the connection.
    ///
    /// Idempotent. Pending calls return `Closed`; the writer sends TLS
    /// close_notify before shutting the socket down.
    pub fn close(&self) {
        self.shared.teardown(Teardown::Closed);
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the server's socket address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.shared.peer
    }

    /// Checks if the connection has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of calls awaiting a reply.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.shared.pending.len()
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("name", &self.shared.name)
            .field("peer", &self.shared.peer)
            .field("pending", &self.pending_calls())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================
// Connection Tasks
// ============================================

/// Delivers responses to the calls waiting on them.
async fn read_loop(
    mut reader: ReadHalf<ClientStream>,
    codec: ProtocolCodec,
    shared: Arc<Shared>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let reason = loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break Teardown::Closed,
            frame = read_frame(&mut reader, &codec) => {
                let mut body = match frame {
                    Ok(Some(body)) => body,
                    Ok(None) => break Teardown::Transport("connection closed by server".into()),
                    Err(e) if e.is_protocol_violation() => break Teardown::Protocol(e.to_string()),
                    Err(e) => break Teardown::Transport(e.to_string()),
                };

                let response: Response = match codec.decode(&mut body) {
                    Ok(response) => response,
                    Err(e) => break Teardown::Protocol(e.to_string()),
                };

                let id = response.id.as_u64();
                match shared.pending.remove(&id) {
                    Some((_, tx)) => {
                        let _ = tx.send(Ok(response));
                    }
                    None if shared.closed.load(Ordering::SeqCst) => break Teardown::Closed,
                    None if shared.abandoned.remove(&id).is_some() => {
                        debug!(client = %shared.name, id = %response.id, "Discarding reply for abandoned call");
                    }
                    None => {
                        break Teardown::Protocol(format!(
                            "response for unknown call {}",
                            response.id
                        ))
                    }
                }
            }
        }
    };

    shared.teardown(reason);
    trace!(client = %shared.name, "Reader task exiting");
}

/// Writes queued request frames in order.
async fn write_loop(
    mut writer: WriteHalf<ClientStream>,
    mut outbound: mpsc::Receiver<BytesMut>,
    shared: Arc<Shared>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = write_frame(&mut writer, &frame).await {
                    shared.teardown(Teardown::Transport(e.to_string()));
                    break;
                }
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        trace!(client = %shared.name, error = %e, "TLS shutdown failed");
    }
    trace!(client = %shared.name, "Writer task exiting");
}

// ============================================
// Tests
// ============================================

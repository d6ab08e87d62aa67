// ============================================
// File: crates/sealrpc-server/src/server.rs
// ============================================
//! # Server Orchestrator
//!
//! ## Creation Reason
//! Main server implementation that owns the listener and the method
//! registry, and manages the accept loop lifecycle.
//!
//! ## Main Functionality
//! - `RpcServer`: Main server struct and lifecycle management
//! - Accept loop with one task per connection
//! - Connection cap
//! - Graceful shutdown of the listening endpoint
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RpcServer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                 Accept Loop (serve)                   │  │
//! │  │   select! { shutdown_rx, listener.accept() }          │  │
//! │  └───────────────┬───────────────────────────────────────┘  │
//! │                  │  tokio::spawn per connection             │
//! │        ┌─────────┼──────────┬────────────┐                  │
//! │        ▼         ▼          ▼            ▼                  │
//! │   ┌────────┐ ┌────────┐ ┌────────┐  ┌────────┐              │
//! │   │ TLS +  │ │ TLS +  │ │ TLS +  │  │  ...   │              │
//! │   │ Conn   │ │ Conn   │ │ Conn   │  │        │              │
//! │   │Handler │ │Handler │ │Handler │  │        │              │
//! │   └────────┘ └────────┘ └────────┘  └────────┘              │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │   MethodRegistry (snapshot taken per connection)      │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `close()` stops accepting only; live connections drain on their own
//! - Methods registered after a connection was accepted are not visible to it
//! - Use tokio::select! for concurrent operations
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use sealrpc_core::credentials::ServerIdentity;
use sealrpc_core::protocol::ProtocolCodec;
use sealrpc_transport::{server_handshake, Listener, PeerInfo, TlsListener, TransportError};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::ConnectionHandler;
use crate::registry::MethodRegistry;

/// Default cap on concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Pause after a transient accept error.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

// ============================================
// RpcServer
// ============================================

/// TLS RPC server.
///
/// # Lifecycle
/// 1. Create with `RpcServer::start(&identity, addr)` or `RpcServer::from_config`
/// 2. Register methods with `register_method`
/// 3. Run `serve().await` until `close()` is called
pub struct RpcServer {
    /// Listening endpoint; taken on close.
    listener: Mutex<Option<Arc<TlsListener>>>,
    /// Address the listener is bound to.
    local_addr: SocketAddr,
    /// Methods served by this instance.
    registry: Arc<MethodRegistry>,
    /// Frame codec shared by every connection.
    codec: ProtocolCodec,
    /// Concurrent connection cap.
    max_connections: usize,
    /// Live connection count.
    active: Arc<AtomicUsize>,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl RpcServer {
    /// Binds a listener on `addr` presenting `identity`.
    ///
    /// # Errors
    /// Returns `Transport(BindFailed | AddressInUse | InvalidAddress)` if the
    /// endpoint cannot be opened. Binding is never retried.
    pub async fn start(identity: &ServerIdentity, addr: &str) -> Result<Self> {
        let listener = TlsListener::bind(addr, identity).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);

        info!("RPC server listening on {}", local_addr);

        Ok(Self {
            listener: Mutex::new(Some(Arc::new(listener))),
            local_addr,
            registry: Arc::new(MethodRegistry::new()),
            codec: ProtocolCodec::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            active: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        })
    }

    /// Loads the identity named by `config` and binds its listen address.
    ///
    /// # Errors
    /// Credential failures are config errors; bind failures as for `start`.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let identity = ServerIdentity::load(&config.tls.cert_file, &config.tls.key_file)?;
        let server = Self::start(&identity, &config.network.listen_addr.to_string())
            .await?
            .with_max_connections(config.limits.max_connections)
            .with_max_frame_size(config.limits.max_frame_size);

        info!(
            "Server configured: max connections={}, max frame size={}",
            server.max_connections,
            server.codec.max_frame_size()
        );

        Ok(server)
    }

    /// Sets the concurrent connection cap.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the frame size limit for every connection.
    #[must_use]
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.codec = self.codec.with_max_frame_size(max_frame_size);
        self
    }

    /// Registers a handler under `name`.
    ///
    /// # Errors
    /// Rejects invalid and duplicate names; see [`MethodRegistry::register`].
    pub fn register_method<F>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(Bytes) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.registry.register(name, handler)
    }

    /// Runs the accept loop until `close()` is called.
    ///
    /// # Errors
    /// Currently always returns `Ok(())`; transient accept failures are
    /// logged and retried.
    pub async fn serve(&self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let listener = self.listener.lock().clone();
        let Some(listener) = listener else {
            debug!("serve() called on a closed server");
            return Ok(());
        };
        if self.shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }

        let acceptor = listener.acceptor();
        info!("Accepting connections on {}", self.local_addr);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            if self.shutdown.load(Ordering::SeqCst) {
                                break;
                            }
                            self.spawn_connection(&acceptor, stream, peer);
                        }
                        Err(TransportError::ShuttingDown) => break,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
            }
        }

        info!("Accept loop stopped on {}", self.local_addr);
        Ok(())
    }

    /// Hands an accepted stream to its own task.
    fn spawn_connection(&self, acceptor: &TlsAcceptor, stream: TcpStream, peer: PeerInfo) {
        let previous = self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(Arc::clone(&self.active));

        if previous >= self.max_connections {
            warn!(
                peer = %peer.addr,
                limit = self.max_connections,
                "Connection limit reached, dropping connection"
            );
            drop(guard);
            drop(stream);
            return;
        }

        let acceptor = acceptor.clone();
        let registry = self.registry.snapshot();
        let codec = self.codec;

        tokio::spawn(async move {
            let _guard = guard;

            let Ok(tls) = server_handshake(&acceptor, stream, &peer).await else {
                return;
            };

            info!(peer = %peer.addr, "Connection opened");

            let outcome = ConnectionHandler::new(tls, peer.addr, registry, codec)
                .run()
                .await;

            info!(
                peer = %peer.addr,
                requests = outcome.requests_served,
                reason = %outcome.reason,
                phase = %outcome.ended_in,
                duration_ms = u64::try_from(peer.age().as_millis()).unwrap_or(u64::MAX),
                "Connection closed"
            );
        });
    }

    /// Closes the listening endpoint.
    ///
    /// Idempotent. `serve()` returns `Ok(())`; established connections are
    /// left running.
    pub fn close(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(listener) = self.listener.lock().take() {
            listener.shutdown();
        }
        let _ = self.shutdown_tx.send(());

        info!("RPC server on {} closed", self.local_addr);
    }

    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the method registry.
    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Checks if `close()` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("local_addr", &self.local_addr)
            .field("methods", &self.registry.len())
            .field("active", &self.active_connections())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Decrements the live connection count when a connection task ends.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================
// Tests
// ============================================

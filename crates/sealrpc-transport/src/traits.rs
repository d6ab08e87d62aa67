// ============================================
// File: crates/sealrpc-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the seams between the network and the RPC layers so that
//! connection handling can be tested over in-memory streams.
//!
//! ## Main Functionality
//! - `Listener`: accept loop interface
//! - `RpcStream`: any byte stream a connection can run over
//! - `PeerInfo`: Metadata about an accepted connection
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync for use in async contexts
//! - `RpcStream` is blanket-implemented; do not implement it by hand
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

// ============================================
// PeerInfo
// ============================================

/// Metadata about the remote end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerInfo {
    /// Remote address (IP and port).
    pub addr: SocketAddr,
    /// When the connection was accepted or dialed.
    pub connected_at: Instant,
}

impl PeerInfo {
    /// Creates a new `PeerInfo` stamped with the current time.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connected_at: Instant::now(),
        }
    }

    /// Returns how long the connection has been open.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

// ============================================
// RpcStream
// ============================================

/// A bidirectional byte stream one RPC connection runs over.
///
/// Implemented for TLS streams in production and `tokio::io::DuplexStream`
/// in tests.
pub trait RpcStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> RpcStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

// ============================================
// Listener Trait
// ============================================

/// Abstract interface for a stream listener.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Stream type produced by `accept`.
    type Stream: Send;

    /// Waits for the next inbound connection.
    ///
    /// # Errors
    /// Returns `ShuttingDown` once the listener is closed, or an I/O error
    /// for a failed accept.
    async fn accept(&self) -> Result<(Self::Stream, PeerInfo)>;

    /// Returns the local address this listener is bound to.
    ///
    /// # Errors
    /// Returns error if address cannot be determined
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Stops accepting new connections.
    fn shutdown(&self);

    /// Returns `true` until `shutdown` has been called.
    fn is_active(&self) -> bool;
}

// ============================================
// File: crates/sealrpc-transport/src/lib.rs
// ============================================
//! # SealRPC Transport - Network I/O Layer
//!
//! ## Creation Reason
//! Provides the encrypted byte streams RPC connections run over and the
//! frame reader/writer used on both ends.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: Listener and stream abstractions
//! - [`tls`]: TLS listener and dialer over TCP
//! - [`frame`]: Length-prefixed frame I/O
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          sealrpc-server     sealrpc-client          │
//! │                    │           │                    │
//! │         ┌──────────┴───────────┤                    │
//! │         ▼                      ▼                    │
//! │   sealrpc-core          sealrpc-transport           │
//! │                         You are here ◄──            │
//! │         │                      │                    │
//! │         └──────────┬───────────┘                    │
//! │                    ▼                                │
//! │             sealrpc-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always use traits for testability
//! - Frames are written whole by a single owner of the write half
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod frame;
pub mod tls;
pub mod traits;

// Re-export primary types
pub use error::{Result, TransportError};
pub use frame::{read_frame, write_frame};
pub use tls::{dial, server_handshake, server_name_for, TlsListener};
pub use traits::{Listener, PeerInfo, RpcStream};

/// Client-side TLS stream type.
pub type ClientStream = tokio_rustls::client::TlsStream<tokio::net::TcpStream>;

/// Server-side TLS stream type.
pub type ServerStream = tokio_rustls::server::TlsStream<tokio::net::TcpStream>;

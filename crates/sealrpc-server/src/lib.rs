// ============================================
// File: crates/sealrpc-server/src/lib.rs
// ============================================
//! # SealRPC Server Library
//!
//! ## Creation Reason
//! Provides the server half of SealRPC: a TLS listener that dispatches
//! framed requests to named handlers registered by the embedding
//! application.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Server configuration management
//! - [`server`]: Listener lifecycle and accept loop
//! - [`registry`]: Method name → handler table
//! - [`handlers`]: Per-connection request loop and built-in methods
//! - [`error`]: Server-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SealRPC Server                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│  RpcServer  │────►│ ConnectionHandler│   │
//! │  │             │     │ accept loop │     │  (1 per conn)   │    │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘    │
//! │                             │                     │             │
//! │                             ▼                     ▼             │
//! │                      ┌─────────────┐     ┌─────────────────┐    │
//! │                      │  Method     │────►│ RegistrySnapshot │   │
//! │                      │  Registry   │     │                 │    │
//! │                      └─────────────┘     └─────────────────┘    │
//! │                                                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Transport Layer                             │
//! │          TlsListener · server_handshake · frame I/O             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Client → TLS → read_frame → decode → handler → encode → write_frame → TLS → Client
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The registry belongs to one server instance; there is no global table
//! - Configuration changes require restart (no hot-reload)
//! - Handler panics are contained per request
//!
//! ## Last Modified
//! v0.1.0 - Initial server library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;

// Re-export primary types
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use handlers::register_builtin;
pub use registry::{MethodHandler, MethodRegistry, RegistrySnapshot};
pub use server::RpcServer;

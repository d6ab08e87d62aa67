// ============================================
// File: crates/sealrpc-client/src/lib.rs
// ============================================
//! # SealRPC Client Library
//!
//! ## Creation Reason
//! Provides the calling side of SealRPC: dial a server, verify its
//! certificate against configured trust anchors, and issue named calls.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`client`]: Connection handle and call multiplexing
//! - [`config`]: Client configuration management
//! - [`error`]: Client-specific error types
//!
//! ## Usage
//! ```no_run
//! use sealrpc_client::RpcClient;
//! use sealrpc_core::TrustAnchors;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let trust = TrustAnchors::load("/etc/sealrpc/ca.pem")?;
//! let client = RpcClient::connect(&trust, "localhost:8443", "example").await?;
//! let reply = client.call("Calc.Add", &br#"{"A":5,"B":3}"#[..]).await?;
//! assert_eq!(&reply[..], br#"{"Sum":8}"#);
//! client.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One client is one TLS connection; there is no reconnect
//! - Dropping the client closes it
//!
//! ## Last Modified
//! v0.1.0 - Initial client library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

// Re-export primary types
pub use client::{ClientOptions, RpcClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};

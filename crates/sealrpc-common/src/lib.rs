// ============================================
// File: crates/sealrpc-common/src/lib.rs
// ============================================
//! # SealRPC Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides the small set of types every SealRPC crate agrees on: the
//! correlation identifier, validated method names, the shared error type
//! and the logging shim used by the binaries.
//!
//! ## Main Functionality
//! - [`types`]: `CorrelationId`, `MethodName`
//! - [`logging`]: `LogLevel`, `LogHandle`, `init_logging`, `fatal`
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        sealrpc-server        sealrpc-client         │
//! │              │                     │                │
//! │              └──────────┬──────────┘                │
//! │                         ▼                           │
//! │                 sealrpc-transport                   │
//! │                         │                           │
//! │                         ▼                           │
//! │                   sealrpc-core                      │
//! │                         │                           │
//! │                         ▼                           │
//! │                 sealrpc-common  ◄── You are here    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//! - `MethodName` rules are part of the wire contract; do not relax them
//!   without a protocol version bump
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use logging::{fatal, init_logging, LogHandle, LogLevel};
pub use types::{CorrelationId, MethodName};

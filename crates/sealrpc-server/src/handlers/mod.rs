// ============================================
// File: crates/sealrpc-server/src/handlers/mod.rs
// ============================================
//! # Request Handlers
//!
//! ## Creation Reason
//! Provides the per-connection request loop and the methods every server
//! ships with.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`connection`]: Reads requests, dispatches them, writes responses
//! - [`builtin`]: `Calc.Add` and `Diagnostics.Echo`
//!
//! ## Handler Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ConnectionHandler (1 per conn)             │
//! │                                                             │
//! │   read_frame ──► decode ──► RegistrySnapshot::lookup        │
//! │                                   │                         │
//! │                                   ▼                         │
//! │                       spawn_blocking(handler.call)          │
//! │                                   │                         │
//! │   write_frame ◄── encode ◄── Response                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers must not block the async runtime; they run on the blocking pool
//! - Log suspicious activity (bad frames) without payload contents
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod builtin;
pub mod connection;

pub use builtin::register_builtin;
pub use connection::{CloseReason, ConnectionHandler, ConnectionOutcome, ConnectionState};

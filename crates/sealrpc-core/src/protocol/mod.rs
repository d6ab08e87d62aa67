// ============================================
// File: crates/sealrpc-core/src/protocol/mod.rs
// ============================================
//! # SealRPC Protocol
//!
//! ## Creation Reason
//! Defines the request/response messages exchanged over an established
//! TLS stream and their binary encoding.
//!
//! ## Protocol Overview
//! ```text
//! Client                                   Server
//!   │                                        │
//!   │  ─────── Request (id, method, args) ──►│
//!   │                                        │ lookup + run handler
//!   │  ◄────── Response (id, error | reply) ─│
//!   │                                        │
//!   │  (any number of requests, any order    │
//!   │   of responses, matched by id)         │
//! ```
//!
//! ## Wire Format Principles
//! - Every message is a frame: `u32` little-endian body length, then body
//! - Little-endian byte order for multi-byte integers
//! - Version byte in every message
//! - Bodies are decoded only once complete
//!
//! ## ⚠️ Important Note for Next Developer
//! - ANY wire change requires a version bump
//! - Keep `codec` tests in sync with the layout tables in `messages`
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;
pub mod version;

// Re-export primary types
pub use codec::{Codec, ProtocolCodec};
pub use messages::{MessageType, Request, Response};
pub use version::{ProtocolVersion, CURRENT_PROTOCOL_VERSION};

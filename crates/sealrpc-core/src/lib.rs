// ============================================
// File: crates/sealrpc-core/src/lib.rs
// ============================================
//! # SealRPC Core - Protocol & Credentials Library
//!
//! ## Creation Reason
//! Holds everything both peers must agree on before a single byte moves:
//! the request/response wire format and the TLS credentials that
//! authenticate the server.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Message definitions (`Request`, `Response`)
//! - Binary codec for the length-prefixed wire format
//! - Protocol version management
//!
//! ### Credentials Module ([`credentials`])
//! - `ServerIdentity`: certificate chain + private key → TLS server config
//! - `TrustAnchors`: PEM certificates → TLS client config
//!
//! ## Security Guarantees
//! - **Confidentiality/Integrity**: rustls (TLS 1.2/1.3, ring provider)
//! - **Authenticity**: clients verify the server chain against their anchors
//! - **No fallback**: there is no plaintext mode
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER implement custom crypto primitives; rustls does the work
//! - Protocol changes MUST bump `CURRENT_PROTOCOL_VERSION`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credentials;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use credentials::{ServerIdentity, TrustAnchors};
pub use error::{CoreError, Result};
pub use protocol::{
    MessageType, ProtocolCodec, ProtocolVersion, Request, Response, CURRENT_PROTOCOL_VERSION,
};

// ============================================
// File: crates/sealrpc-core/src/credentials/mod.rs
// ============================================
//! # Credential Loading
//!
//! ## Creation Reason
//! Turns PEM files on disk into ready-to-use TLS configurations, so that
//! the transport layer never deals with certificates directly.
//!
//! ## Main Functionality
//! - `ServerIdentity`: certificate chain + private key → `rustls::ServerConfig`
//! - `TrustAnchors`: trusted certificates → `rustls::ClientConfig`
//!
//! ## Credential Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Server                                                      │
//! │  ├─ cert_file (PEM chain, leaf first)                        │
//! │  ├─ key_file  (PKCS#8 / PKCS#1 / SEC1)                       │
//! │  └─ ServerIdentity::load → ServerConfig (no client auth)     │
//! │                                                              │
//! │  Client                                                      │
//! │  ├─ trust_file (one or more PEM certificates)                │
//! │  └─ TrustAnchors::load → ClientConfig (verifies server)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Private keys are NEVER logged, not even their length
//! - Both configs use the `ring` provider; keep them on the same provider
//!
//! ## Last Modified
//! v0.1.0 - Initial credential loading

mod identity;
mod trust;

use std::path::Path;
use std::sync::Arc;

use rustls::crypto::CryptoProvider;

pub use identity::ServerIdentity;
pub use trust::TrustAnchors;

/// Returns the crypto provider shared by server and client configs.
pub(crate) fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Renders a path for error messages.
pub(crate) fn display_path(path: &Path) -> String {
    path.display().to_string()
}

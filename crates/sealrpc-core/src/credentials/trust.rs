// ============================================
// File: crates/sealrpc-core/src/credentials/trust.rs
// ============================================
//! # Trust Anchors
//!
//! ## Creation Reason
//! Clients only talk to servers whose certificate chains up to a
//! certificate the operator trusts. This module loads that trust pool.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every certificate block must be accepted; a single bad block fails the
//!   whole load
//! - An empty pool is an error, never "trust nothing silently"
//!
//! ## Last Modified
//! v0.1.0 - Initial trust loading

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use tracing::info;

use super::{crypto_provider, display_path};
use crate::error::{CoreError, Result};

/// Certificates a client accepts as issuers of the server identity.
#[derive(Clone)]
pub struct TrustAnchors {
    config: Arc<ClientConfig>,
    count: usize,
}

impl TrustAnchors {
    /// Loads trusted certificates from a PEM file.
    ///
    /// # Errors
    /// - `CertificateLoad` if the file is unreadable or a block is rejected
    /// - `EmptyTrustPool` if the file has no certificate blocks
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .map_err(|e| CoreError::certificate_load(display_path(path), e.to_string()))?;

        let anchors = Self::build(&pem, &display_path(path))?;
        info!(
            trust = %path.display(),
            anchors = anchors.count,
            "Trust anchors loaded"
        );
        Ok(anchors)
    }

    /// Builds a trust pool from in-memory PEM data.
    ///
    /// # Errors
    /// Same as [`TrustAnchors::load`].
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Self::build(pem, "<memory>")
    }

    fn build(pem: &[u8], source: &str) -> Result<Self> {
        let mut roots = RootCertStore::empty();

        for cert in rustls_pemfile::certs(&mut &pem[..]) {
            let cert = cert.map_err(|e| CoreError::certificate_load(source, e.to_string()))?;
            roots
                .add(cert)
                .map_err(|e| CoreError::certificate_load(source, e.to_string()))?;
        }

        if roots.is_empty() {
            return Err(CoreError::EmptyTrustPool {
                path: source.to_string(),
            });
        }
        let count = roots.len();

        let config = ClientConfig::builder_with_provider(crypto_provider())
            .with_safe_default_protocol_versions()
            .map_err(|e| CoreError::tls_config(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            count,
        })
    }

    /// Returns the TLS client configuration.
    #[must_use]
    pub fn tls_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// Returns the number of trusted certificates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Always `false`; an empty pool cannot be constructed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchors")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

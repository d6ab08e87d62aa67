// ============================================
// File: crates/sealrpc-core/src/credentials/identity.rs
// ============================================
//! # Server Identity
//!
//! ## Creation Reason
//! A server proves who it is with a certificate chain and the matching
//! private key. This module loads both and builds the TLS server config.
//!
//! ## Main Functionality
//! - `ServerIdentity::load`: from PEM files
//! - `ServerIdentity::from_pem`: from in-memory PEM
//!
//! ## ⚠️ Important Note for Next Developer
//! - rustls checks that the key matches the leaf certificate; that check is
//!   what produces `KeyMismatch`
//! - The `Debug` impl must never print key material
//!
//! ## Last Modified
//! v0.1.0 - Initial identity loading

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tracing::{debug, info};

use super::{crypto_provider, display_path};
use crate::error::{CoreError, Result};

// ============================================
// ServerIdentity
// ============================================

/// Certificate chain and private key of a server, ready for TLS.
///
/// # Example
/// ```no_run
/// use sealrpc_core::credentials::ServerIdentity;
///
/// let identity = ServerIdentity::load("server.crt", "server.key")?;
/// assert!(identity.chain_len() >= 1);
/// # Ok::<(), sealrpc_core::CoreError>(())
/// ```
#[derive(Clone)]
pub struct ServerIdentity {
    config: Arc<ServerConfig>,
    chain_len: usize,
}

impl ServerIdentity {
    /// Loads the certificate chain and private key from PEM files.
    ///
    /// # Errors
    /// - `CertificateLoad` if the certificate file is unreadable or has no
    ///   certificate blocks
    /// - `KeyLoad` if the key file is unreadable or has no key block
    /// - `KeyMismatch` if the key does not belong to the leaf certificate
    pub fn load(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        let cert_pem = std::fs::read(cert_path)
            .map_err(|e| CoreError::certificate_load(display_path(cert_path), e.to_string()))?;
        let key_pem = std::fs::read(key_path)
            .map_err(|e| CoreError::key_load(display_path(key_path), e.to_string()))?;

        let identity = Self::build(
            &cert_pem,
            &key_pem,
            &display_path(cert_path),
            &display_path(key_path),
        )?;

        info!(
            cert = %cert_path.display(),
            chain_len = identity.chain_len,
            "Server identity loaded"
        );
        Ok(identity)
    }

    /// Builds an identity from in-memory PEM data.
    ///
    /// # Errors
    /// Same as [`ServerIdentity::load`], with `<memory>` as the path.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        Self::build(cert_pem, key_pem, "<memory>", "<memory>")
    }

    fn build(cert_pem: &[u8], key_pem: &[u8], cert_src: &str, key_src: &str) -> Result<Self> {
        let chain = parse_chain(cert_pem, cert_src)?;
        let key = parse_key(key_pem, key_src)?;
        let chain_len = chain.len();

        let config = ServerConfig::builder_with_provider(crypto_provider())
            .with_safe_default_protocol_versions()
            .map_err(|e| CoreError::tls_config(e.to_string()))?
            .with_no_client_auth()
            .with_single_cert(chain, key)
            .map_err(|e| match e {
                rustls::Error::InconsistentKeys(_) => CoreError::KeyMismatch {
                    reason: e.to_string(),
                },
                other => CoreError::key_load(key_src, other.to_string()),
            })?;

        debug!(chain_len, "TLS server config built");

        Ok(Self {
            config: Arc::new(config),
            chain_len,
        })
    }

    /// Returns the TLS server configuration.
    #[must_use]
    pub fn tls_config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }

    /// Returns the number of certificates in the chain.
    #[must_use]
    pub const fn chain_len(&self) -> usize {
        self.chain_len
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("ServerIdentity")
            .field("chain_len", &self.chain_len)
            .finish_non_exhaustive()
    }
}

// ============================================
// PEM Parsing
// ============================================

fn parse_chain(pem: &[u8], source: &str) -> Result<Vec<CertificateDer<'static>>> {
    let chain = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CoreError::certificate_load(source, e.to_string()))?;

    if chain.is_empty() {
        return Err(CoreError::certificate_load(
            source,
            "no CERTIFICATE block found",
        ));
    }
    Ok(chain)
}

fn parse_key(pem: &[u8], source: &str) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut &pem[..])
        .map_err(|e| CoreError::key_load(source, e.to_string()))?
        .ok_or_else(|| CoreError::key_load(source, "no PRIVATE KEY block found"))
}

// ============================================
// Tests
// ============================================

// ============================================
// File: crates/sealrpc-server/src/registry.rs
// ============================================
//! # Method Registry
//!
//! ## Creation Reason
//! Maps `"Service.Method"` names to the handlers that serve them, so a
//! connection can dispatch a request without knowing anything about the
//! application behind it.
//!
//! ## Main Functionality
//! - `MethodHandler`: opaque bytes in, opaque bytes out or error
//! - `MethodRegistry`: name validation, duplicate rejection, lookups
//! - `RegistrySnapshot`: immutable view held by one connection
//!
//! ## Registry Structure
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Method Registry                     │
//! ├─────────────────────────┬───────────────────────────┤
//! │  Method name            │  Handler                  │
//! ├─────────────────────────┼───────────────────────────┤
//! │  Calc.Add               │  Arc<dyn MethodHandler>   │
//! │  Diagnostics.Echo       │  Arc<dyn MethodHandler>   │
//! └─────────────────────────┴───────────────────────────┘
//! ```
//!
//! ## Usage
//! ```
//! use bytes::Bytes;
//! use sealrpc_server::registry::MethodRegistry;
//!
//! let registry = MethodRegistry::new();
//! registry
//!     .register("Diagnostics.Echo", |args: Bytes| Ok(args.to_vec()))
//!     .unwrap();
//!
//! // Each connection works against the snapshot taken when it was accepted
//! let snapshot = registry.snapshot();
//! assert!(snapshot.lookup("Diagnostics.Echo").is_ok());
//! assert!(snapshot.lookup("Diagnostics.Missing").is_err());
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Names are case-sensitive and unique; duplicates are rejected
//! - Registration swaps in a new map; existing snapshots never change
//! - Never hold the lock while a handler runs
//!
//! ## Last Modified
//! v0.1.0 - Initial method registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use sealrpc_common::types::MethodName;

use crate::error::{Result, ServerError};

// ============================================
// MethodHandler
// ============================================

/// A callable registered under a method name.
///
/// Handlers run on the blocking thread pool. They receive the raw request
/// payload and return the raw reply; the transport never inspects either.
pub trait MethodHandler: Send + Sync + 'static {
    /// Serves one request.
    ///
    /// # Errors
    /// Any error is sent to the caller as the response error string.
    fn call(&self, args: Bytes) -> anyhow::Result<Vec<u8>>;
}

impl<F> MethodHandler for F
where
    F: Fn(Bytes) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
{
    fn call(&self, args: Bytes) -> anyhow::Result<Vec<u8>> {
        self(args)
    }
}

type MethodMap = HashMap<String, Arc<dyn MethodHandler>>;

// ============================================
// MethodRegistry
// ============================================

/// Name → handler table owned by one server.
pub struct MethodRegistry {
    methods: RwLock<Arc<MethodMap>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Registers a closure or function under `name`.
    ///
    /// # Errors
    /// - `Common(InvalidInput)` if `name` is not of the form `Service.Method`
    /// - `DuplicateMethod` if `name` is already registered
    pub fn register<F>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(Bytes) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    /// Registers a type implementing [`MethodHandler`] under `name`.
    ///
    /// # Errors
    /// Same as [`MethodRegistry::register`].
    pub fn register_handler<H>(&self, name: &str, handler: H) -> Result<()>
    where
        H: MethodHandler,
    {
        self.register_arc(name, Arc::new(handler))
    }

    /// Registers an already shared handler under `name`.
    ///
    /// # Errors
    /// Same as [`MethodRegistry::register`].
    pub fn register_arc(&self, name: &str, handler: Arc<dyn MethodHandler>) -> Result<()> {
        let name = MethodName::parse(name)?;

        let mut methods = self.methods.write();
        if methods.contains_key(name.as_str()) {
            return Err(ServerError::DuplicateMethod {
                name: name.into(),
            });
        }

        let mut next = MethodMap::clone(&methods);
        next.insert(name.to_string(), handler);
        *methods = Arc::new(next);

        debug!(method = %name, total = methods.len(), "Method registered");
        Ok(())
    }

    /// Looks up the handler for `name`.
    ///
    /// # Errors
    /// Returns `MethodNotFound` if nothing is registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn MethodHandler>> {
        self.snapshot().lookup(name)
    }

    /// Returns the current table as an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            methods: Arc::clone(&self.methods.read()),
        }
    }

    /// Checks if a method is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.snapshot().names()
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

// ============================================
// RegistrySnapshot
// ============================================

/// Point-in-time view of a registry.
#[derive(Clone)]
pub struct RegistrySnapshot {
    methods: Arc<MethodMap>,
}

impl RegistrySnapshot {
    /// Looks up the handler for `name`.
    ///
    /// # Errors
    /// Returns `MethodNotFound` if `name` was not registered when the
    /// snapshot was taken.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn MethodHandler>> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| ServerError::method_not_found(name))
    }

    /// Returns the number of methods in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Returns all names in the snapshot, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySnapshot")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: Bytes) -> anyhow::Result<Vec<u8>> {
        Ok(args.to_vec())
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = MethodRegistry::new();
        registry.register("Diagnostics.Echo", echo).unwrap();

        let handler = registry.lookup("Diagnostics.Echo").unwrap();
        assert_eq!(handler.call(Bytes::from_static(b"ping")).unwrap(), b"ping");
        assert!(registry.contains("Diagnostics.Echo"));
        assert_eq!(registry.len(), 1);
    }

    struct Prefix(&'static [u8]);

    impl MethodHandler for Prefix {
        fn call(&self, args: Bytes) -> anyhow::Result<Vec<u8>> {
            let mut out = self.0.to_vec();
            out.extend_from_slice(&args);
            Ok(out)
        }
    }

    #[test]
    fn test_register_struct_handler() {
        let registry = MethodRegistry::new();
        registry.register_handler("Greeter.Hello", Prefix(b"hello ")).unwrap();

        let handler = registry.lookup("Greeter.Hello").unwrap();
        assert_eq!(handler.call(Bytes::from_static(b"bob")).unwrap(), b"hello bob");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = MethodRegistry::new();
        registry.register("Calc.Add", echo).unwrap();

        let err = registry.lookup("calc.add").err().unwrap();
        assert!(matches!(err, ServerError::MethodNotFound { .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = MethodRegistry::new();
        registry.register("Calc.Add", echo).unwrap();

        let err = registry.register("Calc.Add", echo).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateMethod { ref name } if name == "Calc.Add"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let registry = MethodRegistry::new();
        for bad in ["Add", "Calc.", ".Add", "Calc.Add.More", "Calc Add.x"] {
            let err = registry.register(bad, echo).unwrap_err();
            assert!(err.is_registration_error(), "accepted {bad:?}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_isolation() {
        let registry = MethodRegistry::new();
        registry.register("Calc.Add", echo).unwrap();

        let before = registry.snapshot();
        registry.register("Calc.Mul", echo).unwrap();

        assert_eq!(before.len(), 1);
        assert!(before.lookup("Calc.Mul").is_err());
        assert!(registry.snapshot().lookup("Calc.Mul").is_ok());
    }

    #[test]
    fn test_names_sorted() {
        let registry = MethodRegistry::new();
        registry.register("Zeta.Run", echo).unwrap();
        registry.register("Alpha.Run", echo).unwrap();
        assert_eq!(registry.names(), vec!["Alpha.Run", "Zeta.Run"]);
    }
}

// ============================================
// File: crates/sealrpc-common/src/logging.rs
// ============================================
//! # Logging Shim
//!
//! ## Creation Reason
//! The RPC crates log through `tracing` macros. Binaries and embedding
//! applications still need a leveled logger they can adjust at runtime
//! (`set_level` / `level`) and a `fatal` exit path; this module provides
//! that on top of `tracing-subscriber`.
//!
//! ## Main Functionality
//! - `LogLevel`: `Debug < Info < Warn < Error < Fatal`
//! - `init_logging`: Installs the global subscriber, returns a `LogHandle`
//! - `LogHandle`: Reloads the active filter when the level changes
//! - `fatal`: Logs with a `FATAL` marker and exits the process
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured level at startup only
//! - At `Fatal` level only `fatal()` messages get through
//!
//! ## Last Modified
//! v0.1.0 - Initial logging shim

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tracing_fmt, reload, EnvFilter, Registry};

use crate::error::{CommonError, Result};

/// Target used by [`fatal`] so the `Fatal` level can still let it through.
pub const FATAL_TARGET: &str = "sealrpc::fatal";

// ============================================
// LogLevel
// ============================================

/// Logging verbosity threshold.
///
/// Messages below the configured level are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Per-request detail.
    Debug = 0,
    /// Connection lifecycle events.
    Info = 1,
    /// Protocol violations and recoverable problems.
    Warn = 2,
    /// Failures that lose work.
    Error = 3,
    /// Only messages that terminate the process.
    Fatal = 4,
}

impl LogLevel {
    /// Returns the `EnvFilter` directive equivalent to this level.
    #[must_use]
    pub fn directive(&self) -> String {
        match self {
            Self::Debug => "debug".into(),
            Self::Info => "info".into(),
            Self::Warn => "warn".into(),
            Self::Error => "error".into(),
            Self::Fatal => format!("off,{FATAL_TARGET}=error"),
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            3 => Self::Error,
            _ => Self::Fatal,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(CommonError::invalid_input(
                "log level",
                format!("unknown level '{other}'"),
            )),
        }
    }
}

// ============================================
// LogHandle
// ============================================

/// Runtime control over the installed log filter.
#[derive(Clone)]
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    level: Arc<AtomicU8>,
}

impl LogHandle {
    /// Changes the active level.
    ///
    /// # Errors
    /// Returns `CommonError::Internal` if the subscriber has been dropped.
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.reload
            .reload(EnvFilter::new(level.directive()))
            .map_err(|e| CommonError::internal(format!("log filter reload failed: {e}")))?;
        self.level.store(level as u8, Ordering::Release);
        Ok(())
    }

    /// Returns the active level.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle")
            .field("level", &self.level())
            .finish()
    }
}

// ============================================
// Initialization
// ============================================

fn layered<W>(
    filter: EnvFilter,
    level: LogLevel,
    writer: W,
    ansi: bool,
) -> (impl tracing::Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter_layer, reload) = reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry().with(filter_layer).with(
        tracing_fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer),
    );

    let handle = LogHandle {
        reload,
        level: Arc::new(AtomicU8::new(level as u8)),
    };

    (subscriber, handle)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Returns `None` if a
/// global subscriber was already installed.
pub fn init_logging(level: LogLevel) -> Option<LogHandle> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let (subscriber, handle) = layered(filter, level, std::io::stderr, true);
    subscriber.try_init().ok().map(|()| handle)
}

/// Logs `message` with a `FATAL` marker and terminates the process with
/// exit status 1.
pub fn fatal(message: impl fmt::Display) -> ! {
    error!(target: FATAL_TARGET, "FATAL: {}", message);
    std::process::exit(1)
}

// ============================================
// Tests
// ============================================

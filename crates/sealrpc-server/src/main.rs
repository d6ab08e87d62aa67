// ============================================
// File: crates/sealrpc-server/src/main.rs
// ============================================
//! # SealRPC Server Entry Point
//!
//! ## Creation Reason
//! Standalone server binary for deployments that only need the built-in
//! methods, and for smoke-testing certificates.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading
//! - Server execution until Ctrl+C
//!
//! ## Usage
//! ```bash
//! sealrpc-server start --config /etc/sealrpc/server.toml
//! sealrpc-server validate --config /etc/sealrpc/server.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured level
//! - Ctrl+C closes the listener; open connections are not waited for
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use sealrpc_common::logging::{fatal, init_logging, LogHandle, LogLevel};
use sealrpc_server::{register_builtin, RpcServer, ServerConfig};

// ============================================
// CLI Definition
// ============================================

/// SealRPC TLS server
#[derive(Parser, Debug)]
#[command(name = "sealrpc-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server with the built-in methods
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/sealrpc/server.toml")]
        config: PathBuf,
    },

    /// Validate configuration file and credentials
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/sealrpc/server.toml")]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = init_logging(LogLevel::Info);

    let result = match cli.command {
        Commands::Start { config } => cmd_start(config, logging.as_ref()).await,
        Commands::Validate { config } => cmd_validate(config).await,
    };

    if let Err(e) = result {
        fatal(format!("{e:#}"));
    }
}

// ============================================
// Commands
// ============================================

/// Starts the server.
async fn cmd_start(config_path: PathBuf, logging: Option<&LogHandle>) -> anyhow::Result<()> {
    let config = ServerConfig::load(&config_path).await?;
    apply_log_level(logging, config.logging.level)?;

    info!("Starting SealRPC server v{}", env!("CARGO_PKG_VERSION"));

    let server = std::sync::Arc::new(RpcServer::from_config(&config).await?);
    register_builtin(server.registry())?;
    info!("Methods: {}", server.registry().names().join(", "));

    let serving = {
        let server = std::sync::Arc::clone(&server);
        tokio::spawn(async move { server.serve().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    server.close();

    serving.await??;

    info!("Server shutdown complete");
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    let config = ServerConfig::load(&config_path).await?;
    let identity =
        sealrpc_core::ServerIdentity::load(&config.tls.cert_file, &config.tls.key_file)?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:           {}", config.listen_addr());
    println!();
    println!("TLS:");
    println!("   Certificate:      {}", config.tls.cert_file.display());
    println!("   Chain length:     {}", identity.chain_len());
    println!("   Key:              {}", config.tls.key_file.display());
    println!();
    println!("Limits:");
    println!("   Max Connections:  {}", config.limits.max_connections);
    println!("   Max Frame Size:   {}", config.limits.max_frame_size);
    println!();
    println!("Logging:");
    println!("   Level:            {}", config.logging.level);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Applies the configured level unless `RUST_LOG` is set.
fn apply_log_level(logging: Option<&LogHandle>, level: LogLevel) -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(());
    }
    if let Some(handle) = logging {
        handle.set_level(level)?;
    }
    Ok(())
}

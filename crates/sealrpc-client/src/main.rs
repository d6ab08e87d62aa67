// ============================================
// File: crates/sealrpc-client/src/main.rs
// ============================================
//! # sealrpc-call
//!
//! ## Creation Reason
//! One-shot command line client for checking a deployment by hand.
//!
//! ## Usage
//! ```bash
//! sealrpc-call --config client.toml Calc.Add '{"A":5,"B":3}'
//! sealrpc-call --config client.toml Diagnostics.Echo hello
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::PathBuf;

use clap::Parser;

use sealrpc_client::{ClientConfig, RpcClient};
use sealrpc_common::logging::{fatal, init_logging, LogLevel};

/// Calls one method on a SealRPC server and prints the reply.
#[derive(Parser, Debug)]
#[command(name = "sealrpc-call")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/sealrpc/client.toml")]
    config: PathBuf,

    /// Method name, e.g. Calc.Add
    method: String,

    /// Argument bytes, sent as given
    #[arg(default_value = "")]
    args: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = init_logging(LogLevel::Warn);

    if let Err(e) = run(cli, logging).await {
        fatal(format!("{e:#}"));
    }
}

async fn run(cli: Cli, logging: Option<sealrpc_common::LogHandle>) -> anyhow::Result<()> {
    let config = ClientConfig::load(&cli.config).await?;
    if std::env::var_os("RUST_LOG").is_none() {
        if let Some(handle) = &logging {
            handle.set_level(config.logging.level)?;
        }
    }

    let client = RpcClient::from_config(&config).await?;
    let reply = client.call(&cli.method, cli.args.into_bytes()).await;
    client.close();

    let reply = reply?;
    println!("{}", String::from_utf8_lossy(&reply));
    Ok(())
}

//! netcfg-admin: serve the configuration admin gRPC service over an
//! in-memory store.
//!
//! # Usage
//! ```bash
//! netcfg-admin [--config admin.toml] [--listen 0.0.0.0:5150] [--verbose]
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use netcfg_admin::grpc::{serve_grpc, AdminGrpcHandler};
use netcfg_admin::{AdminConfig, AdminService, InMemoryStore, SnapshotCompactor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Network configuration admin server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AdminConfig::load(path)?,
        None => AdminConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if args.verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(args.verbose)
        .init();

    let shutdown = CancellationToken::new();
    let store = InMemoryStore::new();
    let compactor = SnapshotCompactor::new(store.clone()).spawn(shutdown.child_token())?;

    let service = AdminService::new(store)
        .with_compaction_fail_fast(config.compaction_fail_fast);
    let handler = AdminGrpcHandler::new(Arc::new(service))
        .with_stream_buffer(config.stream_buffer);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        signal.cancel();
    });

    tracing::info!(addr = %config.listen_addr, "netcfg-admin listening");
    serve_grpc(handler, config.listen_addr, shutdown.clone()).await?;

    shutdown.cancel();
    compactor.await?;
    tracing::info!("netcfg-admin stopped");
    Ok(())
}

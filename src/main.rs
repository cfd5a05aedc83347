//! Steampipe MCP Server - Main entry point.
//!
//! Resolves the connection, connects, and serves MCP over stdio until the
//! host disconnects or a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;
use steampipe_mcp_server::cli::PlatformCli;
use steampipe_mcp_server::config::{Config, DEFAULT_DISCOVERY_TIMEOUT_SECS};
use steampipe_mcp_server::db::{ConnectionManager, ConnectionResolver};
use steampipe_mcp_server::mcp::SteampipeService;
use steampipe_mcp_server::transport::{StdioTransport, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the protocol.
fn init_tracing(config: &Config) {
    if !config.enable_logs {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!("Starting Steampipe MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let resolver = ConnectionResolver::from_config(&config);
    let descriptor = match resolver.resolve(None).await {
        Ok(descriptor) => descriptor,
        Err(e) => {
            // Without a target there is nothing to serve
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("{}", suggestion);
            }
            std::process::exit(1);
        }
    };

    let manager = Arc::new(ConnectionManager::new(resolver, config.pool_settings()));

    // Tools reconnect on first use, so a service that is still starting is not fatal
    if let Err(e) = manager.connect(descriptor).await {
        warn!(error = %e, "Initial connection failed; will retry on first query");
    }

    let cli = PlatformCli::new(
        &config.steampipe_bin,
        Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
    );
    let service = SteampipeService::new(manager.clone(), cli, config.query_timeout_duration())?;
    let transport = StdioTransport::new(service, manager);

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

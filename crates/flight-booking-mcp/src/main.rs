//! Flight booking MCP host: entry point.
//!
//! Serves one session over stdin/stdout. Config comes from the file named by
//! `MCP_DUPLEX_CONFIG`, falling back to defaults; logs go to stderr.

use anyhow::Context;

use flight_booking_mcp::bookings::BookingLedger;
use mcp_duplex::config::resolve_config;
use mcp_duplex::{Session, StreamTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = resolve_config(None).context("Failed to load session config")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = flight_booking_mcp::host_config(config);
    let registry = flight_booking_mcp::host_registry(BookingLedger::new());
    let transport = StreamTransport::stdio(config.writer_capacity);

    tracing::info!(
        "{} v{} waiting for a client on stdio",
        config.implementation.name,
        config.implementation.version
    );

    let session = Session::accept(transport, registry, config)
        .await
        .context("Handshake with client failed")?;

    session.closed().await;
    tracing::info!("Client disconnected, shutting down");
    Ok(())
}

//! minidns server
//!
//! Answers A queries over UDP from the names in its configuration file.
//! Without a configuration every name resolves to 127.0.0.1.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use minidns::config::ServerConfig;
use minidns::server::{run_dns_server, ServerStats, StaticLookup};

/// Minimal authoritative A record server
#[derive(Parser, Debug)]
#[command(name = "minidns-server")]
#[command(version)]
#[command(about = "Answer DNS A queries from a local name table", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "minidns.toml")]
    config: PathBuf,

    /// UDP port (requires root or CAP_NET_BIND_SERVICE for port 53)
    #[arg(short, long)]
    port: Option<u16>,

    /// Local address to bind
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    info!("minidns server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if args.config.exists() {
        ServerConfig::load(&args.config)?
    } else {
        warn!("Config file not found, using defaults");
        ServerConfig::default()
    };

    // Override config with CLI args
    let config = config.with_port(args.port).with_bind_address(args.bind);

    config.validate()?;

    info!("⚙️  Configuration:");
    info!("   Listen: {}:{}", config.bind_address, config.port);
    info!("   Records: {}", config.records.len());
    info!("   Default address: {:?}", config.default_address);
    info!("   NXDOMAIN on miss: {}", config.nxdomain_on_miss);
    info!("   Worker per query: {}", config.worker_per_query);

    let lookup = Arc::new(StaticLookup::from_config(&config));
    let stats = Arc::new(ServerStats::new());
    let config = Arc::new(config);

    let dns_handle = tokio::spawn(run_dns_server(config, lookup, stats.clone()));

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
            Ok(())
        }
        result = dns_handle => {
            error!("DNS server exited: {:?}", result);
            Err(anyhow::anyhow!("DNS server stopped unexpectedly"))
        }
    };

    let snap = stats.snapshot();
    info!(
        "📊 Served {} datagrams: {} answered, {} not found, {} unsupported, {} malformed",
        snap.received, snap.answered, snap.not_found, snap.unsupported, snap.malformed
    );

    outcome
}

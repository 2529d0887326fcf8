//! resolve
//!
//! Ask one DNS server for the A record of one name:
//!
//! ```text
//! resolve <server-ip> <domain-name>
//! ```
//!
//! Prints `Host <name> has IP address: <addr>` and exits 0, or prints a
//! diagnostic to stderr and exits non-zero.

use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

use minidns::config::ClientConfig;
use minidns::ClientResolver;

/// Resolve a domain name to its IPv4 address
#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(version)]
#[command(about = "Resolve a domain name's A record over UDP", long_about = None)]
struct Args {
    /// IPv4 address of the DNS server
    server: Ipv4Addr,

    /// Domain name to resolve
    name: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "resolve.toml")]
    config: PathBuf,

    /// DNS server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds to wait for the reply
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the answer
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = SocketAddr::from((args.server, config.server_port));
    let mut resolver = ClientResolver::new();

    match resolver.resolve(server, &args.name, config.timeout()).await {
        Ok(addr) => {
            println!("Host {} has IP address: {}", args.name, addr);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_timeout() => {
            eprintln!("Timed out trying to receive DNS reply");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Unable to resolve {}: {}", args.name, e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let config = if args.config.exists() {
        ClientConfig::load(&args.config)?
    } else {
        ClientConfig::default()
    };

    let config = config
        .with_server_port(args.port)
        .with_timeout_secs(args.timeout);

    config.validate()?;
    if config.server_port != minidns::config::DNS_PORT {
        warn!("Using non-standard DNS port {}", config.server_port);
    }

    Ok(config)
}

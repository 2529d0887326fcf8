//! DNS Server
//!
//! Receives A queries on a UDP socket and answers them from an
//! [`AddressLookup`]. A bad datagram or a failed send only ends that one
//! exchange; the loop keeps going.
//!
//! By default datagrams are handled one at a time. With
//! `worker_per_query` each datagram gets its own task; workers share only
//! the lookup, the counters and the socket, never a buffer.

mod lookup;
mod stats;

pub use lookup::{AddressLookup, StaticLookup};
pub use stats::{ServerStats, StatsSnapshot};

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::transport::Transport;
use crate::wire::{self, message::RCODE_NXDOMAIN};

/// What happened to one received datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Replied with an A record
    Answered(Ipv4Addr),
    /// Replied without answers: not an IN A question
    NoData,
    /// Replied with NXDOMAIN
    NxDomain,
    /// Name unknown and NXDOMAIN replies are off; nothing sent
    Ignored,
    /// Could not be parsed as a query; nothing sent
    Malformed,
    /// Reply was built but the socket refused it
    SendFailed,
}

/// Bind the configured endpoint and serve forever
pub async fn run_dns_server(
    config: Arc<ServerConfig>,
    lookup: Arc<dyn AddressLookup>,
    stats: Arc<ServerStats>,
) -> anyhow::Result<()> {
    let addr = SocketAddr::new(config.bind_address, config.port);
    let transport = Transport::bind(addr).await?;

    info!("🌐 DNS server listening on {}", addr);

    serve(Arc::new(transport), config, lookup, stats).await
}

/// Receive loop over an already bound transport
pub async fn serve(
    transport: Arc<Transport>,
    config: Arc<ServerConfig>,
    lookup: Arc<dyn AddressLookup>,
    stats: Arc<ServerStats>,
) -> anyhow::Result<()> {
    loop {
        let (datagram, src) = match transport.receive().await {
            Ok(received) => received,
            Err(e) => {
                error!("DNS socket error: {}", e);
                continue;
            }
        };
        stats.inc_received();

        if config.worker_per_query {
            let transport = transport.clone();
            let config = config.clone();
            let lookup = lookup.clone();
            let stats = stats.clone();

            tokio::spawn(async move {
                handle_datagram(&transport, src, &datagram, lookup.as_ref(), &config, &stats)
                    .await;
            });
        } else {
            handle_datagram(&transport, src, &datagram, lookup.as_ref(), &config, &stats).await;
        }
    }
}

/// Handle one datagram from `src`: parse, look up, reply.
pub async fn handle_datagram(
    transport: &Transport,
    src: SocketAddr,
    datagram: &[u8],
    lookup: &dyn AddressLookup,
    config: &ServerConfig,
    stats: &ServerStats,
) -> Outcome {
    let query = match wire::parse_query(datagram) {
        Ok(query) => query,
        Err(e) => {
            warn!("Discarding {} byte datagram from {}: {}", datagram.len(), src, e);
            stats.inc_malformed();
            return Outcome::Malformed;
        }
    };

    debug!(
        "DNS query {:#06x}: {} type {} from {}",
        query.id(),
        query.name,
        query.qtype,
        src
    );

    let (reply, outcome) = if !query.is_a_query() {
        stats.inc_unsupported();
        (wire::build_error_reply(&query, 0), Outcome::NoData)
    } else {
        match lookup.lookup(&query.name) {
            Some(addr) => {
                stats.inc_answered();
                (wire::build_reply(&query, addr, config.ttl), Outcome::Answered(addr))
            }
            None if config.nxdomain_on_miss => {
                stats.inc_not_found();
                (wire::build_error_reply(&query, RCODE_NXDOMAIN), Outcome::NxDomain)
            }
            None => {
                stats.inc_not_found();
                debug!("No address for {}, not replying", query.name);
                return Outcome::Ignored;
            }
        }
    };

    if let Err(e) = transport.send(src, &reply).await {
        warn!("Failed to send reply to {}: {}", src, e);
        stats.inc_send_failures();
        return Outcome::SendFailed;
    }

    outcome
}

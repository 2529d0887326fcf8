//! Client resolver
//!
//! Resolves one name against one server: build the query, send it once,
//! wait for a reply until the deadline, decode it. There is no retry; the
//! caller decides what to do with a failure.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DnsError, Result};
use crate::transport::{Received, Transport};
use crate::wire;

/// Where the last resolution stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Idle,
    QuerySent,
    Answered,
    TimedOut,
    Failed,
}

/// Single-shot A record resolver
#[derive(Debug)]
pub struct ClientResolver {
    /// Transaction ID to use instead of a random one
    fixed_id: Option<u16>,

    state: ResolveState,
}

impl Default for ClientResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientResolver {
    pub fn new() -> Self {
        Self {
            fixed_id: None,
            state: ResolveState::Idle,
        }
    }

    /// Always use `id` as the transaction ID
    pub fn with_fixed_id(mut self, id: u16) -> Self {
        self.fixed_id = Some(id);
        self
    }

    pub fn state(&self) -> ResolveState {
        self.state
    }

    /// Resolve `name` to an IPv4 address by asking `server`, giving up
    /// after `timeout`.
    ///
    /// Exactly one query is sent. Datagrams from any endpoint other than
    /// `server` are dropped and the wait continues toward the same deadline.
    pub async fn resolve(
        &mut self,
        server: SocketAddr,
        name: &str,
        timeout: Duration,
    ) -> Result<Ipv4Addr> {
        self.state = ResolveState::Idle;

        let result = self.exchange(server, name, timeout).await;
        self.state = match &result {
            Ok(_) => ResolveState::Answered,
            Err(e) if e.is_timeout() => ResolveState::TimedOut,
            Err(_) => ResolveState::Failed,
        };
        result
    }

    async fn exchange(
        &mut self,
        server: SocketAddr,
        name: &str,
        timeout: Duration,
    ) -> Result<Ipv4Addr> {
        let id = self.fixed_id.unwrap_or_else(rand::random);
        let query = wire::build_query(id, name)?;

        let transport = Transport::bind_for(server).await?;
        transport.send(server, &query).await?;
        self.state = ResolveState::QuerySent;
        debug!("Query {:#06x} for {} sent to {}", id, name, server);

        let deadline = Instant::now() + timeout;
        loop {
            match transport.receive_until(deadline).await? {
                Received::TimedOut => {
                    warn!("No reply from {} within {:?}", server, timeout);
                    return Err(DnsError::Timeout(timeout));
                }
                Received::Datagram { from, .. } if from != server => {
                    debug!("Ignoring datagram from unexpected source {}", from);
                }
                Received::Datagram { data, .. } => {
                    let address = wire::parse_response(&data, id, name)?;
                    info!("{} resolved to {} by {}", name, address, server);
                    return Ok(address);
                }
            }
        }
    }
}

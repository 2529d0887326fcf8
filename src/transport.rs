//! UDP transport
//!
//! One bound socket per [`Transport`]; the socket is closed when the
//! transport is dropped, on every exit path.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{DnsError, Result};
use crate::wire::MAX_UDP_PAYLOAD;

/// Outcome of a bounded receive
#[derive(Debug)]
pub enum Received {
    /// A datagram and the endpoint that sent it
    Datagram { data: Vec<u8>, from: SocketAddr },
    /// The deadline passed first
    TimedOut,
}

pub struct Transport {
    socket: UdpSocket,
}

impl Transport {
    /// Bind to a specific local endpoint (server side)
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }

    /// Bind an ephemeral port of the same address family as `peer` (client side)
    pub async fn bind_for(peer: SocketAddr) -> Result<Self> {
        let local = if peer.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        Self::bind(local).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send `bytes` to `endpoint` as one datagram. Failures surface immediately.
    pub async fn send(&self, endpoint: SocketAddr, bytes: &[u8]) -> Result<()> {
        let sent = self.socket.send_to(bytes, endpoint).await?;
        if sent != bytes.len() {
            return Err(DnsError::Network(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, bytes.len()),
            )));
        }
        debug!("Sent {} bytes to {}", sent, endpoint);
        Ok(())
    }

    /// Wait indefinitely for the next datagram.
    pub async fn receive(&self) -> Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; MAX_UDP_PAYLOAD];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, from))
    }

    /// Wait for the next datagram for at most `duration`.
    pub async fn receive_with_timeout(&self, duration: Duration) -> Result<Received> {
        self.receive_until(Instant::now() + duration).await
    }

    /// Wait for the next datagram until `deadline`.
    pub async fn receive_until(&self, deadline: Instant) -> Result<Received> {
        match tokio::time::timeout_at(deadline, self.receive()).await {
            Ok(Ok((data, from))) => Ok(Received::Datagram { data, from }),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(Received::TimedOut),
        }
    }
}

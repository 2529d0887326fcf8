//! Server counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-server query counters, updated from every worker
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Datagrams received
    pub received: AtomicU64,

    /// Queries answered with an address
    pub answered: AtomicU64,

    /// Queries for names the lookup does not know
    pub not_found: AtomicU64,

    /// Queries for something other than an IN A record
    pub unsupported: AtomicU64,

    /// Datagrams dropped as malformed
    pub malformed: AtomicU64,

    /// Replies the socket failed to send
    pub send_failures: AtomicU64,
}

/// Plain copy of [`ServerStats`] at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub received: u64,
    pub answered: u64,
    pub not_found: u64,
    pub unsupported: u64,
    pub malformed: u64,
    pub send_failures: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_answered(&self) {
        self.answered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unsupported(&self) {
        self.unsupported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_send_failures(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            answered: self.answered.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

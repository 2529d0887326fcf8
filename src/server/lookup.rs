//! Address lookup
//!
//! The server asks an [`AddressLookup`] for the address of each queried
//! name. Implementations are shared read-only between workers.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::config::ServerConfig;

/// Name to IPv4 address resolution used by the server loop
pub trait AddressLookup: Send + Sync {
    /// `None` means the name is not known
    fn lookup(&self, name: &str) -> Option<Ipv4Addr>;
}

/// Fixed table of names, with an optional catch-all address
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    /// Lowercased names without trailing dot
    records: HashMap<String, Ipv4Addr>,

    fallback: Option<Ipv4Addr>,
}

impl StaticLookup {
    pub fn new(fallback: Option<Ipv4Addr>) -> Self {
        Self {
            records: HashMap::new(),
            fallback,
        }
    }

    /// Build from the server configuration's records and default address
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut lookup = Self::new(config.default_address);
        for (name, addr) in &config.records {
            lookup.insert(name, *addr);
        }
        lookup
    }

    pub fn insert(&mut self, name: &str, addr: Ipv4Addr) {
        self.records.insert(normalize(name), addr);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AddressLookup for StaticLookup {
    fn lookup(&self, name: &str) -> Option<Ipv4Addr> {
        let found = self.records.get(&normalize(name)).copied();
        if found.is_none() {
            debug!("{} not in table, fallback {:?}", name, self.fallback);
        }
        found.or(self.fallback)
    }
}

fn normalize(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        let mut lookup = StaticLookup::new(None);
        lookup.insert("WWW.Example.com.", Ipv4Addr::new(192, 0, 2, 1));

        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.lookup("www.example.COM"), Some(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(lookup.lookup("other.example.com"), None);
    }

    #[test]
    fn test_fallback_address() {
        let lookup = StaticLookup::new(Some(Ipv4Addr::LOCALHOST));
        assert!(lookup.is_empty());
        assert_eq!(lookup.lookup("anything.at.all"), Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_from_config() {
        let config = ServerConfig::default().with_record("db.internal", Ipv4Addr::new(10, 0, 0, 5));
        let lookup = StaticLookup::from_config(&config);

        assert_eq!(lookup.lookup("db.internal"), Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(lookup.lookup("elsewhere"), Some(Ipv4Addr::LOCALHOST));
    }
}

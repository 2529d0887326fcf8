//! Configuration
//!
//! Client and server settings, loadable from TOML. Defaults reproduce the
//! classic behaviour: port 53, a 10 second reply deadline, and a server
//! that answers every name with the loopback address.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use crate::wire::name;

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// Client-side settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// UDP port the server listens on
    pub server_port: u16,

    /// How long to wait for a reply (seconds)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_port: DNS_PORT,
            timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn with_server_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.server_port = port;
        }
        self
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout_secs = secs;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        if self.server_port == 0 {
            anyhow::bail!("server_port must not be zero");
        }
        Ok(())
    }
}

/// Server-side settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    // === Network ===

    /// Local address to bind
    pub bind_address: IpAddr,

    /// UDP port to listen on (53 needs root or CAP_NET_BIND_SERVICE)
    pub port: u16,

    /// Handle each datagram on its own task instead of one at a time
    pub worker_per_query: bool,

    // === Answers ===

    /// TTL placed on every synthesized answer (seconds)
    pub ttl: u32,

    /// Address for names missing from `records`; unset means "not found".
    /// Loopback when no config file is used, unset when a file omits it.
    #[serde(default)]
    pub default_address: Option<Ipv4Addr>,

    /// Answer unknown names with NXDOMAIN rather than staying silent
    pub nxdomain_on_miss: bool,

    /// Known names and their addresses (kept last: a TOML table)
    pub records: BTreeMap<String, Ipv4Addr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DNS_PORT,
            worker_per_query: false,
            ttl: 60,
            default_address: Some(Ipv4Addr::LOCALHOST),
            nxdomain_on_miss: true,
            records: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_bind_address(mut self, addr: Option<IpAddr>) -> Self {
        if let Some(addr) = addr {
            self.bind_address = addr;
        }
        self
    }

    pub fn with_record(mut self, name: &str, addr: Ipv4Addr) -> Self {
        self.records.insert(name.to_string(), addr);
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ttl == 0 {
            anyhow::bail!("ttl must be greater than zero");
        }

        for record in self.records.keys() {
            if name::encode(record).is_err() {
                anyhow::bail!("record name {:?} is not a valid domain name", record);
            }
        }

        Ok(())
    }
}

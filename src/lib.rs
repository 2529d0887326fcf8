//! minidns
//!
//! The smallest useful slice of DNS: resolve one A record over UDP, and
//! answer such queries from a local name table.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  client::ClientResolver   ── one query, one bounded wait     │
//! │  server::run_dns_server   ── receive / look up / reply loop  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  transport::Transport     ── UDP socket + receive deadline   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  wire::message            ── header, question, answer codec  │
//! │  wire::name               ── labels + compression pointers   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod transport;
pub mod wire;

pub use client::{ClientResolver, ResolveState};
pub use error::{DnsError, Result};
pub use server::{run_dns_server, AddressLookup, StaticLookup};
pub use transport::{Received, Transport};

//! DNS wire format (RFC 1035)
//!
//! Every read is bounds-checked against the received datagram; nothing here
//! indexes past the slice it was handed.

pub mod message;
pub mod name;

pub use message::{
    build_error_reply, build_query, build_reply, parse_query, parse_response, DnsHeader,
    ParsedQuery, ResourceRecord, MAX_UDP_PAYLOAD,
};

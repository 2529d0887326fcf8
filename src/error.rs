//! Error types shared by the codec, the transport and the resolver.

use std::io;
use std::time::Duration;

/// Everything that can end a resolution attempt or reject a datagram.
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    /// Domain name cannot be encoded (empty label, label > 63, name > 255)
    #[error("Invalid domain name {0:?}")]
    InvalidName(String),

    /// Wire bytes violate a length, label or pointer invariant
    #[error("Malformed DNS message: {0}")]
    MalformedMessage(&'static str),

    /// Reply carries a transaction ID we did not send
    #[error("Unexpected transaction ID {actual:#06x} (expected {expected:#06x})")]
    UnexpectedId { expected: u16, actual: u16 },

    /// Server answered with a non-zero RCODE
    #[error("Server returned error code {0}")]
    ResponseError(u8),

    /// Reply is well formed but has no answer record
    #[error("Server returned no answer")]
    NoAnswer,

    /// First answer is not an IN A record with 4 bytes of RDATA
    #[error("Unsupported record (type {rtype}, rdlength {rdlength})")]
    UnsupportedRecordType { rtype: u16, rdlength: u16 },

    /// OS-level socket failure
    #[error("Network error: {0}")]
    Network(#[from] io::Error),

    /// No reply before the deadline
    #[error("Timed out after {0:?} waiting for DNS reply")]
    Timeout(Duration),
}

impl DnsError {
    /// True for the timeout outcome, which the CLI reports with its own message
    pub fn is_timeout(&self) -> bool {
        matches!(self, DnsError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_network() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: DnsError = io_err.into();
        assert!(matches!(err, DnsError::Network(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_display_messages() {
        let err = DnsError::UnexpectedId { expected: 1, actual: 0xbeef };
        assert_eq!(
            err.to_string(),
            "Unexpected transaction ID 0xbeef (expected 0x0001)"
        );
        assert_eq!(
            DnsError::ResponseError(3).to_string(),
            "Server returned error code 3"
        );
        assert!(DnsError::Timeout(Duration::from_secs(10)).is_timeout());
    }
}

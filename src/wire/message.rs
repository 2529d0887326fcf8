//! DNS message codec
//!
//! Builds and parses the only message shapes this crate exchanges: a
//! single-question A query, and a reply carrying at most one A answer.

use std::net::Ipv4Addr;

use crate::error::{DnsError, Result};
use crate::wire::name;

/// DNS header size in bytes
pub const HEADER_SIZE: usize = 12;

/// Largest datagram exchanged without EDNS0
pub const MAX_UDP_PAYLOAD: usize = 512;

/// Record type A (IPv4 host address)
pub const TYPE_A: u16 = 1;

/// Class IN (Internet)
pub const CLASS_IN: u16 = 1;

/// DNS flags
pub const FLAG_QR: u16 = 0x8000;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_TC: u16 = 0x0200;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
const OPCODE_MASK: u16 = 0x7800;
const OPCODE_SHIFT: u16 = 11;
const Z_MASK: u16 = 0x0070;
const Z_SHIFT: u16 = 4;
const RCODE_MASK: u16 = 0x000F;

/// RCODE 3: the queried name does not exist
pub const RCODE_NXDOMAIN: u8 = 3;

/// Pointer to the first question's name, which always sits right after the header
const QUESTION_NAME_POINTER: u16 = 0xC000 | HEADER_SIZE as u16;

/// Type + class + TTL + RDLENGTH
const RR_FIXED_LEN: usize = 10;

/// Root name + QTYPE + QCLASS
const MIN_QUESTION_LEN: usize = 5;

/// Fixed 12-byte DNS header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    /// Header for a standard recursive query with one question
    pub fn query(id: u16) -> Self {
        Self {
            id,
            flags: FLAG_RD,
            qdcount: 1,
            ..Default::default()
        }
    }

    /// Read the header from the first 12 bytes of `buf`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(DnsError::MalformedMessage("message shorter than DNS header"));
        }
        let word = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
        Ok(Self {
            id: word(0),
            flags: word(2),
            qdcount: word(4),
            ancount: word(6),
            nscount: word(8),
            arcount: word(10),
        })
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&self.qdcount.to_be_bytes());
        buf.extend_from_slice(&self.ancount.to_be_bytes());
        buf.extend_from_slice(&self.nscount.to_be_bytes());
        buf.extend_from_slice(&self.arcount.to_be_bytes());
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> OPCODE_SHIFT) as u8
    }

    pub fn authoritative(&self) -> bool {
        self.flags & FLAG_AA != 0
    }

    pub fn truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }

    pub fn recursion_available(&self) -> bool {
        self.flags & FLAG_RA != 0
    }

    pub fn z(&self) -> u8 {
        ((self.flags & Z_MASK) >> Z_SHIFT) as u8
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }
}

/// Fields of one resource record, RDATA still raw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    /// Parse the record at `offset`; returns it with the offset just past its RDATA.
    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, consumed) = name::decode(message, offset)?;
        let mut pos = offset + consumed;

        let fixed = message
            .get(pos..pos + RR_FIXED_LEN)
            .ok_or(DnsError::MalformedMessage("truncated resource record"))?;
        let rtype = u16::from_be_bytes([fixed[0], fixed[1]]);
        let class = u16::from_be_bytes([fixed[2], fixed[3]]);
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = usize::from(u16::from_be_bytes([fixed[8], fixed[9]]));
        pos += RR_FIXED_LEN;

        let rdata = message
            .get(pos..pos + rdlength)
            .ok_or(DnsError::MalformedMessage("RDATA runs past end of message"))?
            .to_vec();
        pos += rdlength;

        Ok((
            Self {
                name,
                rtype,
                class,
                ttl,
                rdata,
            },
            pos,
        ))
    }
}

/// A decoded single-question query, as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub header: DnsHeader,
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
    /// Raw question bytes (name + QTYPE + QCLASS), echoed into replies
    question: Vec<u8>,
}

impl ParsedQuery {
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// True when the question asks for an IN A record
    pub fn is_a_query(&self) -> bool {
        self.qtype == TYPE_A && self.qclass == CLASS_IN
    }
}

/// Build a query for the A record of `name` with transaction `id`.
pub fn build_query(id: u16, name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(MAX_UDP_PAYLOAD);
    DnsHeader::query(id).encode(&mut buf);
    name::encode_into(&mut buf, name)?;
    buf.extend_from_slice(&TYPE_A.to_be_bytes());
    buf.extend_from_slice(&CLASS_IN.to_be_bytes());
    Ok(buf)
}

/// Parse a reply to the query `expected_id` for `expected_name`, yielding
/// the address from its first answer.
///
/// Only the first answer is examined; it must be an A record with exactly
/// four bytes of RDATA.
pub fn parse_response(bytes: &[u8], expected_id: u16, expected_name: &str) -> Result<Ipv4Addr> {
    let header = DnsHeader::decode(bytes)?;

    if header.id != expected_id {
        return Err(DnsError::UnexpectedId {
            expected: expected_id,
            actual: header.id,
        });
    }
    if header.rcode() != 0 {
        return Err(DnsError::ResponseError(header.rcode()));
    }
    if header.ancount == 0 {
        return Err(DnsError::NoAnswer);
    }

    let mut pos = HEADER_SIZE;
    for _ in 0..header.qdcount {
        let (qname, consumed) = name::decode(bytes, pos)?;
        if !name::names_equal(&qname, expected_name) {
            return Err(DnsError::MalformedMessage("reply question does not match query"));
        }
        pos += consumed + 4;
        if pos > bytes.len() {
            return Err(DnsError::MalformedMessage("truncated question section"));
        }
    }

    let (answer, _) = ResourceRecord::parse(bytes, pos)?;
    if answer.rtype != TYPE_A || answer.rdata.len() != 4 {
        return Err(DnsError::UnsupportedRecordType {
            rtype: answer.rtype,
            rdlength: answer.rdata.len() as u16,
        });
    }

    Ok(Ipv4Addr::new(
        answer.rdata[0],
        answer.rdata[1],
        answer.rdata[2],
        answer.rdata[3],
    ))
}

/// Parse an incoming query. Flags and counts beyond QDCOUNT >= 1 are not
/// checked; only the first question is read.
pub fn parse_query(bytes: &[u8]) -> Result<ParsedQuery> {
    if bytes.len() < HEADER_SIZE + MIN_QUESTION_LEN {
        return Err(DnsError::MalformedMessage("datagram too short for a query"));
    }

    let header = DnsHeader::decode(bytes)?;
    if header.qdcount == 0 {
        return Err(DnsError::MalformedMessage("query has no question"));
    }

    let (name, consumed) = name::decode(bytes, HEADER_SIZE)?;
    let qtype_at = HEADER_SIZE + consumed;
    let tail = bytes
        .get(qtype_at..qtype_at + 4)
        .ok_or(DnsError::MalformedMessage("truncated question"))?;
    let qtype = u16::from_be_bytes([tail[0], tail[1]]);
    let qclass = u16::from_be_bytes([tail[2], tail[3]]);

    Ok(ParsedQuery {
        header,
        name,
        qtype,
        qclass,
        question: bytes[HEADER_SIZE..qtype_at + 4].to_vec(),
    })
}

fn reply_header(query: &ParsedQuery, rcode: u8, ancount: u16) -> DnsHeader {
    DnsHeader {
        id: query.header.id,
        flags: FLAG_QR | FLAG_AA | (query.header.flags & FLAG_RD) | u16::from(rcode & 0x0F),
        qdcount: 1,
        ancount,
        nscount: 0,
        arcount: 0,
    }
}

/// Build a one-answer reply to `query` resolving its name to `address`.
/// The answer's owner is a compression pointer to the echoed question name.
pub fn build_reply(query: &ParsedQuery, address: Ipv4Addr, ttl: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + query.question.len() + 16);
    reply_header(query, 0, 1).encode(&mut buf);
    buf.extend_from_slice(&query.question);

    buf.extend_from_slice(&QUESTION_NAME_POINTER.to_be_bytes());
    buf.extend_from_slice(&TYPE_A.to_be_bytes());
    buf.extend_from_slice(&CLASS_IN.to_be_bytes());
    buf.extend_from_slice(&ttl.to_be_bytes());
    buf.extend_from_slice(&4u16.to_be_bytes());
    buf.extend_from_slice(&address.octets());
    buf
}

/// Build an answerless reply to `query` with the given RCODE
/// (0 for "name exists, no A data", 3 for NXDOMAIN).
pub fn build_error_reply(query: &ParsedQuery, rcode: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + query.question.len());
    reply_header(query, rcode, 0).encode(&mut buf);
    buf.extend_from_slice(&query.question);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reply for example.com with a compressed A answer of 192.0.2.1
    fn crafted_response(id: u16, flags: u16, ancount: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        DnsHeader {
            id,
            flags,
            qdcount: 1,
            ancount,
            nscount: 0,
            arcount: 0,
        }
        .encode(&mut buf);
        buf.extend_from_slice(b"\x07example\x03com\x00");
        buf.extend_from_slice(&[0, 1, 0, 1]);
        if ancount > 0 {
            buf.extend_from_slice(&[0xC0, 0x0C]);
            buf.extend_from_slice(&[0, 1, 0, 1]);
            buf.extend_from_slice(&300u32.to_be_bytes());
            buf.extend_from_slice(&[0, 4, 192, 0, 2, 1]);
        }
        buf
    }

    #[test]
    fn test_build_query_layout() {
        let query = build_query(0x0001, "example.com").unwrap();
        assert_eq!(&query[..12], &[0, 1, 0x01, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&query[12..25], b"\x07example\x03com\x00");
        assert_eq!(&query[25..], &[0, 1, 0, 1]);

        let header = DnsHeader::decode(&query).unwrap();
        assert!(!header.is_response());
        assert!(header.recursion_desired());
        assert_eq!(header.opcode(), 0);
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount + header.nscount + header.arcount, 0);
    }

    #[test]
    fn test_build_query_invalid_name() {
        assert!(matches!(build_query(1, "a..b"), Err(DnsError::InvalidName(_))));
    }

    #[test]
    fn test_query_then_parse_query() {
        let query = build_query(1, "example.com").unwrap();
        let parsed = parse_query(&query).unwrap();
        assert_eq!(parsed.id(), 1);
        assert_eq!(parsed.name, "example.com");
        assert!(parsed.is_a_query());
    }

    #[test]
    fn test_parse_response_a_record() {
        let resp = crafted_response(0x0001, FLAG_QR | FLAG_RD | FLAG_RA, 1);
        let addr = parse_response(&resp, 0x0001, "example.com").unwrap();
        assert_eq!(addr, Ipv4Addr::new(192, 0, 2, 1));
    }

    #[test]
    fn test_parse_response_uncompressed_owner() {
        let mut resp = crafted_response(7, FLAG_QR, 0);
        resp[7] = 1; // ANCOUNT
        resp.extend_from_slice(b"\x07EXAMPLE\x03com\x00");
        resp.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 10, 1, 2, 3]);
        assert_eq!(
            parse_response(&resp, 7, "example.com").unwrap(),
            Ipv4Addr::new(10, 1, 2, 3)
        );
    }

    #[test]
    fn test_parse_response_rcode_wins_over_answers() {
        let resp = crafted_response(1, FLAG_QR | 3, 1);
        assert!(matches!(
            parse_response(&resp, 1, "example.com"),
            Err(DnsError::ResponseError(3))
        ));

        let resp = crafted_response(1, FLAG_QR | 3, 0);
        assert!(matches!(
            parse_response(&resp, 1, "example.com"),
            Err(DnsError::ResponseError(3))
        ));
    }

    #[test]
    fn test_parse_response_wrong_id() {
        let resp = crafted_response(2, FLAG_QR, 1);
        assert!(matches!(
            parse_response(&resp, 1, "example.com"),
            Err(DnsError::UnexpectedId { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_parse_response_no_answer() {
        let resp = crafted_response(1, FLAG_QR, 0);
        assert!(matches!(
            parse_response(&resp, 1, "example.com"),
            Err(DnsError::NoAnswer)
        ));
    }

    #[test]
    fn test_parse_response_non_a_answer() {
        let mut resp = crafted_response(1, FLAG_QR, 1);
        // answer TYPE sits right after the 2-byte owner pointer
        let type_at = 12 + 13 + 4 + 2;
        resp[type_at + 1] = 28;
        assert!(matches!(
            parse_response(&resp, 1, "example.com"),
            Err(DnsError::UnsupportedRecordType { rtype: 28, rdlength: 4 })
        ));
    }

    #[test]
    fn test_parse_response_truncated() {
        let resp = crafted_response(1, FLAG_QR, 1);
        assert!(matches!(
            parse_response(&resp[..resp.len() - 2], 1, "example.com"),
            Err(DnsError::MalformedMessage(_))
        ));
        assert!(matches!(
            parse_response(&resp[..11], 1, "example.com"),
            Err(DnsError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_response_question_mismatch() {
        let resp = crafted_response(1, FLAG_QR, 1);
        assert!(matches!(
            parse_response(&resp, 1, "example.org"),
            Err(DnsError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_query_rejects_short_datagram() {
        assert!(matches!(
            parse_query(&[0, 1, 2, 3, 4]),
            Err(DnsError::MalformedMessage(_))
        ));

        let mut query = build_query(1, "example.com").unwrap();
        query.truncate(query.len() - 2);
        assert!(matches!(parse_query(&query), Err(DnsError::MalformedMessage(_))));
    }

    #[test]
    fn test_parse_query_requires_question() {
        let mut query = build_query(1, "example.com").unwrap();
        query[5] = 0;
        assert!(matches!(parse_query(&query), Err(DnsError::MalformedMessage(_))));
    }

    #[test]
    fn test_build_reply_roundtrip() {
        let query = build_query(0x1234, "seed.example.net").unwrap();
        let parsed = parse_query(&query).unwrap();
        let reply = build_reply(&parsed, Ipv4Addr::new(127, 0, 0, 1), 60);

        let header = DnsHeader::decode(&reply).unwrap();
        assert_eq!(header.id, 0x1234);
        assert!(header.is_response());
        assert!(header.recursion_desired());
        assert_eq!(header.rcode(), 0);
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount, 1);

        // question echoed verbatim
        assert_eq!(&reply[12..query.len()], &query[12..]);
        // owner is a pointer to offset 12
        assert_eq!(&reply[query.len()..query.len() + 2], &[0xC0, 0x0C]);

        let (answer, end) = ResourceRecord::parse(&reply, query.len()).unwrap();
        assert_eq!(answer.name, "seed.example.net");
        assert_eq!(answer.ttl, 60);
        assert_eq!(end, reply.len());

        assert_eq!(
            parse_response(&reply, 0x1234, "seed.example.net").unwrap(),
            Ipv4Addr::LOCALHOST
        );
    }

    #[test]
    fn test_build_reply_keeps_rd_clear() {
        let mut query = build_query(9, "example.com").unwrap();
        query[2] = 0; // clear RD
        let parsed = parse_query(&query).unwrap();
        let reply = build_reply(&parsed, Ipv4Addr::new(192, 0, 2, 7), 30);
        assert!(!DnsHeader::decode(&reply).unwrap().recursion_desired());
    }

    #[test]
    fn test_build_error_reply_nxdomain() {
        let query = build_query(5, "missing.example").unwrap();
        let parsed = parse_query(&query).unwrap();
        let reply = build_error_reply(&parsed, RCODE_NXDOMAIN);

        let header = DnsHeader::decode(&reply).unwrap();
        assert!(header.is_response());
        assert_eq!(header.rcode(), RCODE_NXDOMAIN);
        assert_eq!(header.ancount, 0);
        assert_eq!(reply.len(), query.len());
        assert!(matches!(
            parse_response(&reply, 5, "missing.example"),
            Err(DnsError::ResponseError(3))
        ));
    }

    #[test]
    fn test_header_flag_accessors() {
        let header = DnsHeader {
            flags: FLAG_QR | (2 << OPCODE_SHIFT) | FLAG_AA | FLAG_TC | FLAG_RA | (5 << Z_SHIFT) | 2,
            ..Default::default()
        };
        assert!(header.is_response());
        assert_eq!(header.opcode(), 2);
        assert!(header.authoritative());
        assert!(header.truncated());
        assert!(!header.recursion_desired());
        assert!(header.recursion_available());
        assert_eq!(header.z(), 5);
        assert_eq!(header.rcode(), 2);
    }
}

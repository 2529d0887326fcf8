//! Domain name codec
//!
//! Text form is dot-separated labels (`www.example.com`). Wire form is a
//! run of length-prefixed labels ended by a zero byte, or cut short by a
//! two-byte compression pointer (top bits `11`) whose target holds the rest
//! of the name.

use crate::error::{DnsError, Result};

/// RFC 1035: maximum label length
pub const MAX_LABEL_LEN: usize = 63;

/// RFC 1035: maximum wire length of a name, terminator included
pub const MAX_NAME_WIRE_LEN: usize = 255;

/// Top two bits of a length byte marking a compression pointer
const POINTER_MASK: u8 = 0xC0;

/// Encode `name` into wire form.
pub fn encode(name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(name.len() + 2);
    encode_into(&mut buf, name)?;
    Ok(buf)
}

/// Append the wire form of `name` to `buf`.
///
/// A single trailing dot is accepted (`example.com.`). Empty labels, labels
/// longer than 63 bytes, the root name and names longer than 255 bytes on
/// the wire are rejected with [`DnsError::InvalidName`]; `buf` is left
/// untouched on error.
pub fn encode_into(buf: &mut Vec<u8>, name: &str) -> Result<()> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        return Err(DnsError::InvalidName(name.to_string()));
    }

    let start = buf.len();
    for label in trimmed.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            buf.truncate(start);
            return Err(DnsError::InvalidName(name.to_string()));
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);

    if buf.len() - start > MAX_NAME_WIRE_LEN {
        buf.truncate(start);
        return Err(DnsError::InvalidName(name.to_string()));
    }

    Ok(())
}

/// Decode the name starting at `start` in `message`.
///
/// Returns the text form (no trailing dot, empty for the root name) and the
/// number of bytes the caller's cursor must advance. When a compression
/// pointer is met, the cursor stops right after those two bytes no matter
/// how far the pointed-to labels run.
///
/// Every pointer must reference bytes before the label run it ends, so a
/// chain of pointers strictly decreases and cannot cycle.
pub fn decode(message: &[u8], start: usize) -> Result<(String, usize)> {
    if start >= message.len() {
        return Err(DnsError::MalformedMessage("name offset beyond end of message"));
    }

    let mut labels: Vec<&str> = Vec::new();
    let mut pos = start;
    // Start of the label run currently being read
    let mut run_start = start;
    let mut consumed: Option<usize> = None;
    let mut wire_len = 0usize;
    let mut jumps = 0usize;
    let max_jumps = message.len() / 2;

    loop {
        let Some(&len_byte) = message.get(pos) else {
            return Err(DnsError::MalformedMessage("name runs past end of message"));
        };

        if len_byte & POINTER_MASK == POINTER_MASK {
            let Some(&low) = message.get(pos + 1) else {
                return Err(DnsError::MalformedMessage("truncated compression pointer"));
            };
            let target = (usize::from(len_byte & !POINTER_MASK) << 8) | usize::from(low);
            if target >= run_start {
                return Err(DnsError::MalformedMessage(
                    "compression pointer does not point backwards",
                ));
            }
            jumps += 1;
            if jumps > max_jumps {
                return Err(DnsError::MalformedMessage("too many compression pointers"));
            }
            if consumed.is_none() {
                consumed = Some(pos + 2 - start);
            }
            pos = target;
            run_start = target;
            continue;
        }

        if len_byte & POINTER_MASK != 0 {
            // 0x40 / 0x80 label types were never standardised for use
            return Err(DnsError::MalformedMessage("reserved label type"));
        }

        if len_byte == 0 {
            if consumed.is_none() {
                consumed = Some(pos + 1 - start);
            }
            break;
        }

        let len = usize::from(len_byte);
        let label_end = pos + 1 + len;
        if label_end > message.len() {
            return Err(DnsError::MalformedMessage("label runs past end of message"));
        }

        wire_len += len + 1;
        if wire_len + 1 > MAX_NAME_WIRE_LEN {
            return Err(DnsError::MalformedMessage("name longer than 255 bytes"));
        }

        let raw = &message[pos + 1..label_end];
        if raw.contains(&b'.') {
            return Err(DnsError::MalformedMessage("label contains a dot"));
        }
        let label = std::str::from_utf8(raw)
            .map_err(|_| DnsError::MalformedMessage("label is not valid UTF-8"))?;
        labels.push(label);
        pos = label_end;
    }

    let consumed = consumed.unwrap_or(1);
    Ok((labels.join("."), consumed))
}

/// Compare two names the way DNS does: ASCII case-insensitive, trailing dot ignored.
pub fn names_equal(a: &str, b: &str) -> bool {
    let a = a.strip_suffix('.').unwrap_or(a);
    let b = b.strip_suffix('.').unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}

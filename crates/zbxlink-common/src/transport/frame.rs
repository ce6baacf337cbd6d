//! Trapper wire frame encoding and decoding.
//!
//! Every trapper request and (framed) response uses the 13-byte header:
//! ```text
//! ┌───────────┬─────────┬────────────────┬──────────────┐
//! │ Signature │ Version │ Payload length │ JSON payload │
//! │ 4 bytes   │ 1 byte  │ 8 bytes        │ N bytes      │
//! │ "ZBXD"    │ 0x01    │ u64 LE         │ UTF-8        │
//! └───────────┴─────────┴────────────────┴──────────────┘
//! ```
//!
//! The length field must equal the payload byte length exactly; there is no
//! padding and no trailing data.

use crate::protocol::error::{Result, ZbxError};

/// ASCII signature identifying the trapper protocol.
pub const PROTOCOL_SIGNATURE: [u8; 4] = *b"ZBXD";

/// Protocol version marker (the single known frame format).
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Header size in bytes (fixed, exactly 13).
pub const HEADER_SIZE: usize = 13;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes as declared on the wire.
    pub payload_len: u64,
}

impl FrameHeader {
    pub fn new(payload_len: u64) -> Self {
        Self { payload_len }
    }

    /// Encode the header to bytes (signature + version + LE length).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&PROTOCOL_SIGNATURE);
        buf[4] = PROTOCOL_VERSION;
        buf[5..13].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Decode a header from the start of `buf`.
    ///
    /// Returns `None` if the buffer is shorter than [`HEADER_SIZE`] or does
    /// not begin with the trapper signature and version. Callers reading a
    /// server reply use `None` to fall back to scanning the raw bytes, since
    /// not every server build frames its status.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        if buf[0..4] != PROTOCOL_SIGNATURE || buf[4] != PROTOCOL_VERSION {
            return None;
        }
        let mut len = [0u8; 8];
        len.copy_from_slice(&buf[5..13]);
        Some(Self {
            payload_len: u64::from_le_bytes(len),
        })
    }

    /// Total frame length (header + payload) in bytes.
    pub fn frame_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_len
    }

    /// Reject declared lengths above `max_payload`.
    pub fn validate(&self, max_payload: usize) -> Result<()> {
        if self.payload_len > max_payload as u64 {
            return Err(ZbxError::Protocol(format!(
                "declared payload of {} bytes exceeds maximum {}",
                self.payload_len, max_payload
            )));
        }
        Ok(())
    }
}

/// Build the full wire frame for `payload`.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let header = FrameHeader::new(payload.len() as u64);
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(payload);
    frame
}

/// True when `buf` could still grow into a frame that starts with the
/// trapper signature and version.
///
/// Incremental readers use this to keep buffering instead of scanning bytes
/// that may belong to the length field; a declared length like 32123 puts
/// literal `{}` bytes on the wire.
pub fn is_header_prefix(buf: &[u8]) -> bool {
    let n = buf.len().min(4);
    if buf[..n] != PROTOCOL_SIGNATURE[..n] {
        return false;
    }
    buf.len() < 5 || buf[4] == PROTOCOL_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = FrameHeader::new(421);
        let decoded = FrameHeader::decode(&original.encode()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_header_little_endian_byte_order() {
        let header = FrameHeader::new(0x0102030405060708);
        let bytes = header.encode();

        assert_eq!(&bytes[0..4], b"ZBXD");
        assert_eq!(bytes[4], 0x01);

        // Least significant byte first.
        assert_eq!(bytes[5], 0x08);
        assert_eq!(bytes[6], 0x07);
        assert_eq!(bytes[7], 0x06);
        assert_eq!(bytes[8], 0x05);
        assert_eq!(bytes[9], 0x04);
        assert_eq!(bytes[10], 0x03);
        assert_eq!(bytes[11], 0x02);
        assert_eq!(bytes[12], 0x01);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        assert!(FrameHeader::decode(&[0u8; 12]).is_none());
        assert!(FrameHeader::decode(b"ZBXD\x01").is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_signature() {
        let mut bytes = FrameHeader::new(10).encode();
        bytes[0] = b'X';
        assert!(FrameHeader::decode(&bytes).is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let mut bytes = FrameHeader::new(10).encode();
        bytes[4] = 0x02;
        assert!(FrameHeader::decode(&bytes).is_none());
    }

    #[test]
    fn test_validate_declared_length() {
        assert!(FrameHeader::new(100).validate(100).is_ok());
        let result = FrameHeader::new(101).validate(100);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_encode_frame_layout() {
        let payload = br#"{"request":"sender data","data":[]}"#;
        let frame = encode_frame(payload);

        assert_eq!(frame.len(), HEADER_SIZE + payload.len());
        assert_eq!(&frame[0..4], b"ZBXD");
        assert_eq!(frame[4], 0x01);
        assert_eq!(&frame[5..13], &(payload.len() as u64).to_le_bytes());
        assert_eq!(&frame[13..], payload);
    }

    #[test]
    fn test_encode_frame_empty_payload() {
        let frame = encode_frame(b"");
        assert_eq!(frame.len(), HEADER_SIZE);
        assert_eq!(&frame[5..13], &0u64.to_le_bytes());
    }

    #[test]
    fn test_header_prefix_detection() {
        assert!(is_header_prefix(b""));
        assert!(is_header_prefix(b"ZB"));
        assert!(is_header_prefix(b"ZBXD"));
        assert!(is_header_prefix(b"ZBXD\x01"));
        // Length bytes carrying brace characters are still a valid prefix.
        assert!(is_header_prefix(b"ZBXD\x01{}"));
        assert!(is_header_prefix(&encode_frame(b"{}")));

        assert!(!is_header_prefix(b"{"));
        assert!(!is_header_prefix(b"garbage"));
        assert!(!is_header_prefix(b"ZBXE"));
        assert!(!is_header_prefix(b"ZBXD\x02"));
    }
}

//! Trapper transport layer.
//!
//! Everything needed to push one framed request to a trapper listener and
//! decode its acknowledgement:
//!
//! - **[`frame`]**: the wire frame codec with the `ZBXD` signature, version
//!   byte, 8-byte little-endian payload length and JSON payload.
//! - **[`scan`]**: balanced-brace extraction of the status object from a raw
//!   reply buffer.
//! - **[`TrapperTransport`]**: synchronous single-use-connection TCP
//!   transport with explicit connect/write/read timeouts.

pub mod frame;
pub mod scan;
pub mod tcp;

pub use frame::{
    encode_frame, is_header_prefix, FrameHeader, HEADER_SIZE, PROTOCOL_SIGNATURE, PROTOCOL_VERSION,
};
pub use scan::extract_json_object;
pub use tcp::{TrapperTransport, DEFAULT_TIMEOUT, MAX_RESPONSE_SIZE};

//! zbxlink Common Types and Transport
//!
//! This crate provides the protocol definitions and the trapper TCP transport
//! for the zbxlink Zabbix client library.
//!
//! # Overview
//!
//! zbxlink talks to a Zabbix server over two independent channels: pushed
//! metric values go to the trapper listener over a small binary TCP protocol,
//! and API calls go to the JSON-RPC HTTP endpoint. This crate holds the shared
//! pieces used by both client crates:
//!
//! - **Protocol layer**: sender payload types, the JSON-RPC envelope, and the
//!   error taxonomy
//! - **Transport layer**: the trapper wire frame codec and a synchronous TCP
//!   transport
//!
//! # Wire format
//!
//! One trapper request is a single frame:
//! `"ZBXD"` + version byte `0x01` + 8-byte little-endian payload length +
//! UTF-8 JSON payload. The acknowledgement is a JSON status object, usually
//! behind the same framing; the transport digs it out either way.
//!
//! # Components
//!
//! - [`protocol`] - payload and envelope types, [`ZbxError`]
//! - [`transport`] - frame codec, reply scanner, [`transport::TrapperTransport`]
//!
//! # Example
//!
//! ```
//! use zbxlink_common::{ItemValue, SenderRequest};
//!
//! let mut batch = SenderRequest::new();
//! batch.push(ItemValue::new("server1", "cpu.load", 0.42));
//! assert_eq!(batch.len(), 1);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;

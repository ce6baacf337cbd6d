//! Trapper protocol sender for Zabbix.
//!
//! This crate pushes item values to a Zabbix server or proxy the way the
//! `zabbix_sender` utility does: values are queued into a batch and shipped
//! in a single framed TCP request per [`ZabbixSender::send`] call.
//!
//! # Example
//!
//! ```no_run
//! use zbxlink_sender::{ZabbixSender, DEFAULT_TRAPPER_PORT};
//!
//! let mut sender = ZabbixSender::new("zabbix.example.com", DEFAULT_TRAPPER_PORT);
//! sender.add("web01", "app.requests", 1024);
//! let status = sender.send()?;
//! println!("{}", status["info"]);
//! # Ok::<(), zbxlink_sender::ZbxError>(())
//! ```

pub mod sender;

pub use sender::{ZabbixSender, DEFAULT_SERVER, DEFAULT_TRAPPER_PORT};
pub use zbxlink_common::protocol::error::{Result, ZbxError};
pub use zbxlink_common::protocol::trapper::ItemValue;

//! Zabbix JSON-RPC API client and chart fetcher.
//!
//! Talks to the Zabbix web frontend on two surfaces:
//!
//! - **[`ZabbixApi::call`]**: JSON-RPC 2.0 over HTTP POST to
//!   `api_jsonrpc.php`, with the session token carried in the envelope's
//!   `auth` member.
//! - **Chart pages**: HTTP GET against `chart.php` / `chart2.php` returning
//!   raw image bytes, authenticated with the `zbx_sessionid` cookie.
//!
//! Both surfaces share the session obtained by [`ZabbixApi::login`].
//!
//! # Example
//!
//! ```no_run
//! use zbxlink_api::{ZabbixApi, GraphRangeQuery};
//!
//! # async fn run() -> zbxlink_api::Result<()> {
//! let mut api = ZabbixApi::new("http://zabbix.example.com/zabbix")?;
//! api.login("Admin", "zabbix").await?;
//!
//! let version = api.api_version().await?;
//! println!("server {}", version);
//!
//! let image = api
//!     .fetch_graph_chart_range(&GraphRangeQuery::new("524"))
//!     .await?;
//! std::fs::write("graph.png", image)?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod client;

pub use chart::{GraphChartQuery, GraphRangeQuery, ItemChartQuery};
pub use client::{
    ZabbixApi, API_ENDPOINT, DEFAULT_HTTP_TIMEOUT, JSON_RPC_CONTENT_TYPE, USER_AGENT,
};
pub use zbxlink_common::protocol::error::{Result, ZbxError};

//! Chart image retrieval.
//!
//! The Zabbix frontend renders graphs through plain PHP pages rather than
//! the JSON-RPC API: `chart.php` draws ad-hoc graphs from item ids and
//! `chart2.php` draws saved graphs by graph id. Both authenticate with the
//! `zbx_sessionid` cookie, which is the same token `user.login` returns.
//!
//! Three query shapes cover the frontend generations that are still in the
//! field: item-based charts (Zabbix 2.x), graph-id charts with a
//! period/stime window (3.x) and graph-id charts with a from/to range (4+).

use serde::Serialize;
use zbxlink_common::protocol::error::{Result, ZbxError};

use crate::client::ZabbixApi;

/// Query for `chart.php`, drawing one item's latest data (Zabbix 2.x).
///
/// Fields mirror the page's query parameters; everything is carried as text
/// the way the frontend parses it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemChartQuery {
    /// Graph window length in seconds.
    pub period: String,
    /// Window start as a `YYYYMMDDhhmmss` stamp.
    pub stime: String,
    #[serde(rename = "itemids[0]")]
    pub itemid: String,
    #[serde(rename = "type")]
    pub graph_type: String,
    #[serde(rename = "updateProfile")]
    pub update_profile: String,
    #[serde(rename = "profileIdx")]
    pub profile_idx: String,
    #[serde(rename = "profileIdx2")]
    pub profile_idx2: String,
    /// Rendered image width in pixels.
    pub width: String,
}

impl ItemChartQuery {
    /// Creates a query for `itemid` with the frontend's usual defaults.
    pub fn new(itemid: impl Into<String>) -> Self {
        Self {
            itemid: itemid.into(),
            ..Self::default()
        }
    }
}

impl Default for ItemChartQuery {
    fn default() -> Self {
        Self {
            period: "3600".to_string(),
            stime: "20180704103038".to_string(),
            itemid: String::new(),
            graph_type: "0".to_string(),
            update_profile: "1".to_string(),
            profile_idx: "web.item.graph".to_string(),
            profile_idx2: String::new(),
            width: "1782".to_string(),
        }
    }
}

/// Query for `chart2.php`, drawing a saved graph over a period/stime window
/// (Zabbix 3.x).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphChartQuery {
    pub graphid: String,
    /// Graph window length in seconds.
    pub period: String,
    /// Window start as a `YYYYMMDDhhmmss` stamp.
    pub stime: String,
    #[serde(rename = "updateProfile")]
    pub update_profile: String,
    #[serde(rename = "profileIdx")]
    pub profile_idx: String,
    #[serde(rename = "profileIdx2")]
    pub profile_idx2: String,
    /// Rendered image width in pixels.
    pub width: String,
}

impl GraphChartQuery {
    /// Creates a query for `graphid` with the frontend's usual defaults.
    pub fn new(graphid: impl Into<String>) -> Self {
        Self {
            graphid: graphid.into(),
            ..Self::default()
        }
    }
}

impl Default for GraphChartQuery {
    fn default() -> Self {
        Self {
            graphid: String::new(),
            period: "3600".to_string(),
            stime: "20180704103038".to_string(),
            update_profile: "1".to_string(),
            profile_idx: "web.item.graph".to_string(),
            profile_idx2: String::new(),
            width: "1782".to_string(),
        }
    }
}

/// Query for `chart2.php`, drawing a saved graph over an absolute from/to
/// range (Zabbix 4 and later).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphRangeQuery {
    pub graphid: String,
    /// Range start as `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "from")]
    pub from_time: String,
    /// Range end as `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "to")]
    pub to_time: String,
    #[serde(rename = "profileIdx")]
    pub profile_idx: String,
    #[serde(rename = "profileIdx2")]
    pub profile_idx2: String,
    /// Rendered image width in pixels.
    pub width: String,
}

impl GraphRangeQuery {
    /// Creates a query for `graphid` with the frontend's usual defaults.
    pub fn new(graphid: impl Into<String>) -> Self {
        Self {
            graphid: graphid.into(),
            ..Self::default()
        }
    }

    /// Sets the absolute time range.
    pub fn with_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_time = from.into();
        self.to_time = to.into();
        self
    }
}

impl Default for GraphRangeQuery {
    fn default() -> Self {
        Self {
            graphid: String::new(),
            from_time: "2019-06-01 00:00:00".to_string(),
            to_time: "2019-07-01 00:00:00".to_string(),
            profile_idx: "web.graphs.filter".to_string(),
            profile_idx2: String::new(),
            width: "1782".to_string(),
        }
    }
}

impl ZabbixApi {
    /// Fetches an item chart image from `chart.php` (Zabbix 2.x).
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::InvalidRequest`] when called before
    /// [`login`](Self::login) and [`ZbxError::Http`] when the frontend
    /// answers with something other than an image.
    pub async fn fetch_item_chart(&self, query: &ItemChartQuery) -> Result<Vec<u8>> {
        self.fetch_chart("chart.php", query).await
    }

    /// Fetches a saved-graph image from `chart2.php` with a period/stime
    /// window (Zabbix 3.x).
    pub async fn fetch_graph_chart(&self, query: &GraphChartQuery) -> Result<Vec<u8>> {
        self.fetch_chart("chart2.php", query).await
    }

    /// Fetches a saved-graph image from `chart2.php` with an absolute
    /// from/to range (Zabbix 4 and later).
    pub async fn fetch_graph_chart_range(&self, query: &GraphRangeQuery) -> Result<Vec<u8>> {
        self.fetch_chart("chart2.php", query).await
    }

    async fn fetch_chart<Q: Serialize>(&self, page: &str, query: &Q) -> Result<Vec<u8>> {
        let token = self.session.as_ref().ok_or_else(|| {
            ZbxError::InvalidRequest(
                "chart fetch requires a session; call login first".to_string(),
            )
        })?;

        // Sibling of api_jsonrpc.php under the same frontend root.
        let url = self.endpoint.join(page).map_err(|e| {
            ZbxError::InvalidRequest(format!("invalid chart page {}: {}", page, e))
        })?;

        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(url)
            .header(reqwest::header::COOKIE, format!("zbx_sessionid={}", token))
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZbxError::Http(format!("{} returned HTTP {}", page, status)));
        }

        // An expired or bogus session gets the login page back with a 200.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if content_type.starts_with("text/html") {
            return Err(ZbxError::Http(format!(
                "{} answered with an HTML page instead of an image; session missing or expired",
                page
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_http_error(e))?;
        Ok(bytes.to_vec())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Url;
use serde_json::{json, Value};
use zbxlink_common::protocol::error::{Result, ZbxError};
use zbxlink_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

/// Path of the JSON-RPC endpoint relative to the frontend base URL.
pub const API_ENDPOINT: &str = "api_jsonrpc.php";

/// Content type the Zabbix frontend expects for JSON-RPC posts.
pub const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

/// User agent sent with every request.
pub const USER_AGENT: &str = "rust/zbxlink";

/// Default timeout applied to each HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Methods answered before authentication.
///
/// The frontend rejects these when the envelope carries an `auth` member,
/// even a null one, so the member is stripped entirely.
const UNAUTHENTICATED_METHODS: &[&str] = &["apiinfo.version"];

/// Client for the Zabbix JSON-RPC API and chart endpoints.
///
/// Construction performs no network I/O; call [`login`](Self::login) to
/// obtain a session before invoking authenticated methods or fetching
/// charts. The session token doubles as the `zbx_sessionid` cookie the
/// chart endpoints authenticate with.
///
/// # Example
///
/// ```no_run
/// use zbxlink_api::ZabbixApi;
/// use serde_json::json;
///
/// # async fn run() -> zbxlink_api::Result<()> {
/// let mut api = ZabbixApi::new("http://zabbix.example.com/zabbix")?;
/// api.login("Admin", "zabbix").await?;
///
/// let hosts = api.call("host.get", json!({"output": "extend"})).await?;
/// println!("{}", hosts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ZabbixApi {
    pub(crate) endpoint: Url,
    pub(crate) http: reqwest::Client,
    pub(crate) session: Option<String>,
    pub(crate) timeout: Duration,
    request_id: AtomicU64,
}

impl ZabbixApi {
    /// Creates a client for the frontend at `base_url`.
    ///
    /// The JSON-RPC endpoint is derived by joining [`API_ENDPOINT`] onto the
    /// base URL, with or without a trailing slash:
    /// `http://host/zabbix` and `http://host/zabbix/` both resolve to
    /// `http://host/zabbix/api_jsonrpc.php`.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::InvalidRequest`] when `base_url` is not a valid
    /// absolute URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let endpoint = Self::build_endpoint(base_url.as_ref())?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ZbxError::Http(e.to_string()))?;

        Ok(Self {
            endpoint,
            http,
            session: None,
            timeout,
            request_id: AtomicU64::new(1),
        })
    }

    fn build_endpoint(base_url: &str) -> Result<Url> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let root = Url::parse(&normalized).map_err(|e| {
            ZbxError::InvalidRequest(format!("invalid base URL {}: {}", base_url, e))
        })?;
        root.join(API_ENDPOINT).map_err(|e| {
            ZbxError::InvalidRequest(format!("invalid base URL {}: {}", base_url, e))
        })
    }

    /// Returns the resolved JSON-RPC endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the current session token, if logged in.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Resumes a previously obtained session without logging in again.
    ///
    /// The token is not checked against the server until the next call.
    pub fn set_session(&mut self, token: impl Into<String>) {
        self.session = Some(token.into());
    }

    /// Authenticates with `user.login` and stores the session token.
    ///
    /// The token is also returned for callers that persist sessions
    /// externally.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::Api`] when the frontend rejects the credentials
    /// and [`ZbxError::Protocol`] when the login result is not the expected
    /// token string.
    pub async fn login(
        &mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<String> {
        let user = user.into();
        let password = password.into();
        let params = json!({"user": user, "password": password});
        let result = self.call("user.login", params).await?;

        let token = result.as_str().ok_or_else(|| {
            ZbxError::Protocol(format!("user.login returned a non-string session: {}", result))
        })?;

        tracing::debug!("Session established for endpoint {}", self.endpoint);
        self.session = Some(token.to_string());
        Ok(token.to_string())
    }

    /// Invokes an arbitrary API method and returns its `result` member.
    ///
    /// The envelope carries the stored session token as `auth` (or null
    /// before login). For the handful of methods served before
    /// authentication the `auth` member is omitted entirely, as the
    /// frontend requires.
    ///
    /// # Arguments
    ///
    /// * `method` - API method name such as `host.get`
    /// * `params` - Method parameters, object or array
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::Api`] for a JSON-RPC `error` member,
    /// [`ZbxError::Http`] for a non-success HTTP status and
    /// [`ZbxError::Protocol`] when the body is not a JSON-RPC response.
    pub async fn call(&self, method: impl AsRef<str>, params: Value) -> Result<Value> {
        let method = method.as_ref();
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(method, params, self.session.clone(), id);

        let mut body = serde_json::to_value(&request)?;
        if UNAUTHENTICATED_METHODS.contains(&method) {
            if let Some(envelope) = body.as_object_mut() {
                envelope.remove("auth");
            }
        }

        tracing::debug!("Calling {} (id {})", method, id);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZbxError::Http(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| self.map_http_error(e))?;
        parsed.into_result()
    }

    /// Returns the server's API version string via `apiinfo.version`.
    ///
    /// Works without authentication.
    pub async fn api_version(&self) -> Result<String> {
        let result = self.call("apiinfo.version", json!({})).await?;
        result
            .as_str()
            .map(|v| v.to_string())
            .ok_or_else(|| {
                ZbxError::Protocol(format!("apiinfo.version returned a non-string: {}", result))
            })
    }

    pub(crate) fn map_http_error(&self, err: reqwest::Error) -> ZbxError {
        if err.is_timeout() {
            ZbxError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_connect() {
            ZbxError::Connection(err.to_string())
        } else if err.is_decode() {
            ZbxError::Protocol(format!("invalid JSON-RPC response: {}", err))
        } else {
            ZbxError::Http(err.to_string())
        }
    }
}

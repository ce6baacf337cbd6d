//! Zabbix JSON-RPC 2.0 envelope types.
//!
//! The Zabbix API transports JSON-RPC 2.0 over HTTP with one extension: every
//! request carries an `auth` member holding the session token obtained from
//! `user.login` (`null` before login). The token-less `apiinfo.version` method
//! requires the member to be absent entirely; that quirk is handled by the API
//! client, not here.
//!
//! # Example
//!
//! ```
//! use zbxlink_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(
//!     "user.login",
//!     json!({"user": "Admin", "password": "zabbix"}),
//!     None,
//!     1,
//! );
//! assert_eq!(request.method, "user.login");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::error::{Result, ZbxError};

/// JSON-RPC 2.0 request with the Zabbix `auth` member.
///
/// `auth` serializes as `null` when no session token is held; the
/// `apiinfo.version` method is the only one that must drop the member
/// altogether.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Name of the API method to invoke (e.g. `host.get`)
    pub method: String,
    /// Method parameters (object or array)
    pub params: Value,
    /// Session token from `user.login`, `null` when not authenticated
    pub auth: Option<String>,
    /// Request identifier
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value, auth: Option<String>, id: u64) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            auth,
            id,
        }
    }
}

/// JSON-RPC 2.0 response: exactly one of `result` / `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Result value on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier (matches the request)
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcResponse {
    /// Collapses the response into the caller-facing result.
    ///
    /// An `error` member becomes [`ZbxError::Api`]; a response with neither
    /// member is malformed and becomes [`ZbxError::Protocol`].
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        self.result
            .ok_or_else(|| ZbxError::Protocol("response carries neither result nor error".into()))
    }
}

/// JSON-RPC 2.0 error member.
///
/// Zabbix uses the standard `code`/`message` pair and puts the human-readable
/// detail ("Login name or password is incorrect.") into `data` as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcError> for ZbxError {
    fn from(err: JsonRpcError) -> Self {
        ZbxError::Api {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

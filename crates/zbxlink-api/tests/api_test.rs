//! API client integration tests against an in-process mock frontend.
//!
//! The mock speaks just enough of the Zabbix frontend surface to exercise
//! the client: `api_jsonrpc.php` for JSON-RPC posts and `chart.php` /
//! `chart2.php` for cookie-authenticated image GETs. Every request is
//! captured so tests can assert the exact bytes the client put on the wire.

use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use zbxlink_api::{GraphChartQuery, GraphRangeQuery, ItemChartQuery, ZabbixApi, ZbxError};

/// Session token the mock frontend hands out on `user.login`.
const SESSION_TOKEN: &str = "0424bd59b807674191e7d77572075f33";

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One request as seen by the mock frontend.
#[derive(Debug, Clone)]
struct CapturedRequest {
    path: String,
    query: String,
    content_type: Option<String>,
    user_agent: Option<String>,
    cookie: Option<String>,
    body: Value,
}

/// Mock Zabbix frontend running on a separate task.
struct TestFrontend {
    addr: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestFrontend {
    /// Starts a new mock frontend on a random port.
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let captured: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        let server_captured = captured.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let captured = server_captured.clone();

                                tokio::spawn(async move {
                                    let service = service_fn(move |req| {
                                        let captured = captured.clone();
                                        async move { handle(req, captured).await }
                                    });

                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        eprintln!("Server error: {}", err);
                                    }
                                });
                            }
                            Err(err) => {
                                eprintln!("Accept error: {}", err);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            captured,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Frontend base URL, no trailing slash.
    fn base_url(&self) -> String {
        format!("http://{}/zabbix", self.addr)
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for TestFrontend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    req: Request<Incoming>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let content_type = header_string(&req, "content-type");
    let user_agent = header_string(&req, "user-agent");
    let cookie = header_string(&req, "cookie");

    let body_bytes = req.into_body().collect().await?.to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    captured.lock().unwrap().push(CapturedRequest {
        path: path.clone(),
        query,
        content_type,
        user_agent,
        cookie: cookie.clone(),
        body: body.clone(),
    });

    if path.ends_with("api_jsonrpc.php") {
        return Ok(api_response(&body));
    }
    if path.ends_with("chart.php") || path.ends_with("chart2.php") {
        return Ok(chart_response(cookie.as_deref()));
    }

    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::from_static(b"not found")))
        .unwrap())
}

fn header_string(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn api_response(envelope: &Value) -> Response<Full<Bytes>> {
    let id = envelope["id"].clone();
    let method = envelope["method"].as_str().unwrap_or_default();

    let reply = match method {
        "user.login" => json!({"jsonrpc": "2.0", "result": SESSION_TOKEN, "id": id}),
        "apiinfo.version" => {
            // The real frontend rejects this method when auth is present.
            if envelope.as_object().map(|o| o.contains_key("auth")).unwrap_or(false) {
                json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32602,
                        "message": "Invalid params.",
                        "data": "The \"apiinfo.version\" method must be called without authorization."
                    },
                    "id": id
                })
            } else {
                json!({"jsonrpc": "2.0", "result": "5.2.6", "id": id})
            }
        }
        "host.get" => json!({
            "jsonrpc": "2.0",
            "result": [{"hostid": "10084", "host": "Zabbix server"}],
            "id": id
        }),
        "server.fault" => {
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from_static(b"boom")))
                .unwrap();
        }
        _ => json!({
            "jsonrpc": "2.0",
            "error": {"code": -32601, "message": "Method not found", "data": method},
            "id": id
        }),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(serde_json::to_vec(&reply).unwrap())))
        .unwrap()
}

fn chart_response(cookie: Option<&str>) -> Response<Full<Bytes>> {
    let authed = cookie
        .map(|c| c.contains(&format!("zbx_sessionid={}", SESSION_TOKEN)))
        .unwrap_or(false);

    if authed {
        let mut image = PNG_MAGIC.to_vec();
        image.extend_from_slice(b"chartdata");
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "image/png")
            .body(Full::new(Bytes::from(image)))
            .unwrap()
    } else {
        // The frontend serves its login page with a 200 for dead sessions.
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/html; charset=UTF-8")
            .body(Full::new(Bytes::from_static(b"<html><body>sign in</body></html>")))
            .unwrap()
    }
}

// ============================================================================
// JSON-RPC Tests
// ============================================================================

#[tokio::test]
async fn test_login_sends_expected_envelope() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();

    let token = api.login("Admin", "zabbix").await.unwrap();
    assert_eq!(token, SESSION_TOKEN);
    assert_eq!(api.session(), Some(SESSION_TOKEN));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].path.ends_with("/zabbix/api_jsonrpc.php"));
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/json-rpc")
    );
    assert_eq!(requests[0].user_agent.as_deref(), Some("rust/zbxlink"));
    assert_eq!(
        requests[0].body,
        json!({
            "jsonrpc": "2.0",
            "method": "user.login",
            "params": {"user": "Admin", "password": "zabbix"},
            "auth": null,
            "id": 1
        })
    );
}

#[tokio::test]
async fn test_call_carries_session_token() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();
    api.login("Admin", "zabbix").await.unwrap();

    let hosts = api.call("host.get", json!({"output": "extend"})).await.unwrap();
    assert_eq!(hosts[0]["hostid"], "10084");

    let requests = server.requests();
    assert_eq!(requests[1].body["method"], "host.get");
    assert_eq!(requests[1].body["auth"], SESSION_TOKEN);
    assert_eq!(requests[1].body["params"], json!({"output": "extend"}));
}

#[tokio::test]
async fn test_request_ids_increment() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();

    api.login("Admin", "zabbix").await.unwrap();
    api.call("host.get", json!({})).await.unwrap();
    api.call("host.get", json!({})).await.unwrap();

    let ids: Vec<i64> = server
        .requests()
        .iter()
        .map(|r| r.body["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_apiinfo_version_omits_auth() {
    let server = TestFrontend::new().await;
    let api = ZabbixApi::new(server.base_url()).unwrap();

    let version = api.api_version().await.unwrap();
    assert_eq!(version, "5.2.6");

    let requests = server.requests();
    let envelope = requests[0].body.as_object().unwrap();
    assert!(!envelope.contains_key("auth"));
    assert_eq!(envelope["method"], "apiinfo.version");
}

#[tokio::test]
async fn test_api_error_maps_to_typed_error() {
    let server = TestFrontend::new().await;
    let api = ZabbixApi::new(server.base_url()).unwrap();

    let err = api.call("no.such.method", json!({})).await.unwrap_err();
    match err {
        ZbxError::Api { code, message, data } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
            assert_eq!(data, Some(json!("no.such.method")));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_status_maps_to_http_error() {
    let server = TestFrontend::new().await;
    let api = ZabbixApi::new(server.base_url()).unwrap();

    let err = api.call("server.fault", json!({})).await.unwrap_err();
    match err {
        ZbxError::Http(msg) => assert!(msg.contains("500")),
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_frontend_is_a_connection_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ZabbixApi::new(format!("http://{}/zabbix", addr)).unwrap();
    let err = api.call("host.get", json!({})).await.unwrap_err();
    assert!(matches!(err, ZbxError::Connection(_)));
}

// ============================================================================
// Chart Tests
// ============================================================================

#[tokio::test]
async fn test_chart_fetch_sends_cookie_and_query() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();
    api.login("Admin", "zabbix").await.unwrap();

    let image = api
        .fetch_item_chart(&ItemChartQuery::new("23296"))
        .await
        .unwrap();
    assert_eq!(&image[0..8], &PNG_MAGIC);

    let requests = server.requests();
    let chart = &requests[1];
    assert!(chart.path.ends_with("/zabbix/chart.php"));
    assert_eq!(
        chart.cookie.as_deref(),
        Some(format!("zbx_sessionid={}", SESSION_TOKEN).as_str())
    );
    assert!(chart.query.contains("itemids%5B0%5D=23296"));
    assert!(chart.query.contains("period=3600"));
    assert!(chart.query.contains("profileIdx=web.item.graph"));
}

#[tokio::test]
async fn test_graph_queries_hit_chart2() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();
    api.login("Admin", "zabbix").await.unwrap();

    api.fetch_graph_chart(&GraphChartQuery::new("524")).await.unwrap();
    api.fetch_graph_chart_range(&GraphRangeQuery::new("524"))
        .await
        .unwrap();

    let requests = server.requests();
    assert!(requests[1].path.ends_with("/zabbix/chart2.php"));
    assert!(requests[1].query.contains("graphid=524"));
    assert!(requests[1].query.contains("stime=20180704103038"));

    assert!(requests[2].path.ends_with("/zabbix/chart2.php"));
    assert!(requests[2].query.contains("from=2019-06-01+00%3A00%3A00"));
    assert!(requests[2].query.contains("profileIdx=web.graphs.filter"));
}

#[tokio::test]
async fn test_expired_session_html_is_detected() {
    let server = TestFrontend::new().await;
    let mut api = ZabbixApi::new(server.base_url()).unwrap();
    api.set_session("00000000000000000000000000000000");

    let err = api
        .fetch_item_chart(&ItemChartQuery::new("1"))
        .await
        .unwrap_err();
    match err {
        ZbxError::Http(msg) => assert!(msg.contains("HTML")),
        other => panic!("expected Http error, got {:?}", other),
    }
}

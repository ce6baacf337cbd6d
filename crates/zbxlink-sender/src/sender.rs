use std::time::Duration;

use serde_json::Value;
use zbxlink_common::protocol::error::Result;
use zbxlink_common::protocol::trapper::{ItemValue, SenderRequest};
use zbxlink_common::transport::TrapperTransport;

/// Default trapper server address.
pub const DEFAULT_SERVER: &str = "127.0.0.1";

/// Default trapper port of a Zabbix server or proxy.
pub const DEFAULT_TRAPPER_PORT: u16 = 10051;

/// Client for pushing item values to a Zabbix server over the trapper
/// protocol.
///
/// Values are accumulated into a pending batch with [`add`](Self::add) and
/// shipped with a single [`send`](Self::send) call, which opens one TCP
/// connection, writes one framed `sender data` request and reads back the
/// server's status object.
///
/// The batch is cleared after every `send`, whether it succeeded or not, so
/// a retry never resubmits values the server may already have accepted.
/// Delivery is at most once; callers that need stronger guarantees must
/// re-`add` on error themselves.
///
/// # Example
///
/// ```no_run
/// use zbxlink_sender::ZabbixSender;
///
/// let mut sender = ZabbixSender::new("zabbix.example.com", 10051);
/// sender.add("web01", "app.requests", 1024);
/// sender.add("web01", "app.latency", 0.42);
/// let status = sender.send()?;
/// println!("server said: {}", status);
/// # Ok::<(), zbxlink_sender::ZbxError>(())
/// ```
pub struct ZabbixSender {
    server: String,
    port: u16,
    batch: SenderRequest,
    transport: TrapperTransport,
}

impl ZabbixSender {
    /// Creates a sender targeting the given server and trapper port.
    ///
    /// No connection is made until [`send`](Self::send) is called.
    ///
    /// # Arguments
    ///
    /// * `server` - Hostname or IP address of the Zabbix server or proxy
    /// * `port` - Trapper port, usually [`DEFAULT_TRAPPER_PORT`]
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        ZabbixSender {
            server: server.into(),
            port,
            batch: SenderRequest::new(),
            transport: TrapperTransport::new(),
        }
    }

    /// Sets the connect and socket timeout used for every `send`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use zbxlink_sender::ZabbixSender;
    ///
    /// let sender = ZabbixSender::default().with_timeout(Duration::from_secs(2));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = TrapperTransport::with_timeout(timeout);
        self
    }

    /// Returns the configured server address.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the configured trapper port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Queues a value stamped with the current time.
    ///
    /// The value is coerced to its text form, which is what the trapper
    /// protocol carries regardless of the item's type on the server.
    ///
    /// # Arguments
    ///
    /// * `host` - Host name exactly as configured in Zabbix
    /// * `key` - Trapper item key on that host
    /// * `value` - Any displayable value; sent as text
    pub fn add(&mut self, host: impl Into<String>, key: impl Into<String>, value: impl ToString) {
        self.batch.push(ItemValue::new(host, key, value));
    }

    /// Queues a value with an explicit collection timestamp.
    ///
    /// # Arguments
    ///
    /// * `clock` - Unix timestamp in seconds at which the value was observed
    pub fn add_with_clock(
        &mut self,
        host: impl Into<String>,
        key: impl Into<String>,
        value: impl ToString,
        clock: i64,
    ) {
        self.batch.push(ItemValue::new(host, key, value).with_clock(clock));
    }

    /// Drops all queued values without sending them.
    pub fn clear(&mut self) {
        self.batch.clear();
    }

    /// Returns the number of queued values.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Returns `true` if no values are queued.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Sends the queued batch and returns the server's status object.
    ///
    /// Opens a fresh TCP connection, writes the framed request, reads the
    /// reply and closes the connection. An empty batch is sent as an empty
    /// `data` array, which the server answers with a zero-processed status.
    ///
    /// The batch is cleared before this method returns, on success and on
    /// failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::Connection`](zbxlink_common::ZbxError::Connection)
    /// when the server cannot be reached,
    /// [`ZbxError::Timeout`](zbxlink_common::ZbxError::Timeout) when the
    /// connect or the reply exceeds the configured timeout, and
    /// [`ZbxError::Protocol`](zbxlink_common::ZbxError::Protocol) when the
    /// reply carries no parseable status object.
    pub fn send(&mut self) -> Result<Value> {
        let outcome = self.dispatch();
        self.batch.clear();
        outcome
    }

    fn dispatch(&self) -> Result<Value> {
        let payload = serde_json::to_vec(&self.batch)?;
        tracing::debug!(
            "Sending {} value(s) to {}:{}",
            self.batch.len(),
            self.server,
            self.port
        );
        let addr = format!("{}:{}", self.server, self.port);
        let status = self.transport.exchange(&addr, &payload)?;
        tracing::debug!("Trapper reply: {}", status);
        Ok(status)
    }
}

impl Default for ZabbixSender {
    /// Creates a sender targeting `127.0.0.1:10051`.
    fn default() -> Self {
        ZabbixSender::new(DEFAULT_SERVER, DEFAULT_TRAPPER_PORT)
    }
}

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::Value;

use crate::protocol::error::{Result, ZbxError};
use crate::transport::frame::{self, FrameHeader, HEADER_SIZE};
use crate::transport::scan::extract_json_object;

/// Default timeout applied to connect, write and read (5 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on the status reply buffer (1 MB).
///
/// Trapper acknowledgements are a few hundred bytes; anything approaching this
/// limit is a misbehaving peer, not a status.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

const READ_CHUNK_SIZE: usize = 4096;

/// Synchronous trapper transport.
///
/// Each `send` call owns exactly one single-use TCP connection: connect,
/// write the frame, read the status, drop the stream. Connections are never
/// reused or pooled.
///
/// # Reply handling
///
/// The server's acknowledgement is a JSON object that may sit behind trapper
/// framing bytes. The transport reads incrementally: once a valid frame
/// header is buffered, the declared length bounds the read; once the buffer
/// cannot begin a frame header, the balanced-brace scanner decides when the
/// object is complete. There is no sleep-then-read-once; every blocking call
/// is covered by the configured timeout.
///
/// # Example
///
/// ```no_run
/// use zbxlink_common::transport::TrapperTransport;
///
/// let transport = TrapperTransport::new();
/// let payload = br#"{"request":"sender data","data":[]}"#;
/// let status = transport.exchange("127.0.0.1:10051", payload).unwrap();
/// println!("server said: {}", status);
/// ```
pub struct TrapperTransport {
    timeout: Duration,
}

impl TrapperTransport {
    /// Creates a transport with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport whose connect/write/read calls are bounded by
    /// `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connects to `addr`, trying each resolved address until one succeeds.
    ///
    /// The returned stream has read and write timeouts configured.
    ///
    /// # Errors
    ///
    /// [`ZbxError::Connection`] when the address does not resolve, every
    /// resolved address refuses or times out, or the timeouts cannot be set.
    pub fn connect(&self, addr: &str) -> Result<TcpStream> {
        let socket_addrs = addr
            .to_socket_addrs()
            .map_err(|e| ZbxError::Connection(format!("Invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout)).map_err(|e| {
                        ZbxError::Connection(format!("Failed to set read timeout: {}", e))
                    })?;
                    stream.set_write_timeout(Some(self.timeout)).map_err(|e| {
                        ZbxError::Connection(format!("Failed to set write timeout: {}", e))
                    })?;

                    tracing::debug!("Connected to trapper at {}", socket_addr);
                    return Ok(stream);
                }
                Err(e) => {
                    last_err = Some(e);
                }
            }
        }

        Err(ZbxError::Connection(format!(
            "Failed to connect to {}: {}",
            addr,
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string())
        )))
    }

    /// Writes the full wire frame (header + payload) for `payload` and
    /// flushes.
    pub fn send_frame(&self, stream: &mut TcpStream, payload: &[u8]) -> Result<()> {
        let frame = frame::encode_frame(payload);

        stream
            .write_all(&frame)
            .map_err(|e| self.map_io_error(e, "writing frame"))?;
        stream
            .flush()
            .map_err(|e| self.map_io_error(e, "flushing frame"))?;

        Ok(())
    }

    /// Reads the server's status reply and returns the raw bytes of the first
    /// complete JSON object in it.
    ///
    /// Reads incrementally until the object completes, the peer closes, the
    /// reply outgrows [`MAX_RESPONSE_SIZE`], or the read timeout fires. When
    /// the reply opens with a valid frame header, the declared length bounds
    /// the read and the object is extracted from the framed payload only.
    /// Raw scanning starts only after the buffered bytes diverge from a frame
    /// header prefix or the peer closes.
    ///
    /// # Errors
    ///
    /// [`ZbxError::Protocol`] when no JSON object can be extracted (truncated
    /// frame, non-JSON payload, oversized reply); [`ZbxError::Timeout`] /
    /// [`ZbxError::Connection`] for the corresponding I/O failures.
    pub fn read_status(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut declared: Option<u64> = None;
        let mut eof = false;

        loop {
            if declared.is_none() && buf.len() >= HEADER_SIZE {
                if let Some(header) = FrameHeader::decode(&buf) {
                    header.validate(MAX_RESPONSE_SIZE)?;
                    declared = Some(header.frame_len());
                    tracing::debug!("Framed reply, {} payload bytes declared", header.payload_len);
                }
            }

            match declared {
                Some(total) if (buf.len() as u64) >= total => {
                    let payload = &buf[HEADER_SIZE..total as usize];
                    return match extract_json_object(payload) {
                        Some(obj) => Ok(obj.to_vec()),
                        None => Err(ZbxError::Protocol(
                            "framed reply carries no JSON object".into(),
                        )),
                    };
                }
                // Scan the raw buffer only once it can no longer begin a
                // frame header; the length field may carry brace bytes.
                None if eof || !frame::is_header_prefix(&buf) => {
                    if let Some(obj) = extract_json_object(&buf) {
                        return Ok(obj.to_vec());
                    }
                }
                _ => {}
            }

            if eof {
                return Err(ZbxError::Protocol(if declared.is_some() {
                    "connection closed before the declared frame completed".into()
                } else {
                    "no JSON object found in reply".into()
                }));
            }
            if buf.len() >= MAX_RESPONSE_SIZE {
                return Err(ZbxError::Protocol(format!(
                    "reply exceeded {} bytes without a JSON object",
                    MAX_RESPONSE_SIZE
                )));
            }

            match stream.read(&mut chunk) {
                Ok(0) => eof = true,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(self.map_io_error(e, "reading status reply")),
            }
        }
    }

    /// One full round trip: connect, send the framed `payload`, read and
    /// decode the status object. The connection is dropped before returning.
    pub fn exchange(&self, addr: &str, payload: &[u8]) -> Result<Value> {
        let mut stream = self.connect(addr)?;
        self.send_frame(&mut stream, payload)?;
        let raw = self.read_status(&mut stream)?;

        serde_json::from_slice(&raw)
            .map_err(|e| ZbxError::Protocol(format!("invalid status JSON: {}", e)))
    }

    /// Maps I/O errors onto the error enum. Timeouts become `Timeout` and
    /// lost connections become `Connection`; everything else stays `Io`.
    fn map_io_error(&self, err: std::io::Error, context: &str) -> ZbxError {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                ZbxError::Timeout(self.timeout.as_millis() as u64)
            }
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe => {
                ZbxError::Connection(format!("{}: connection lost", context))
            }
            _ => ZbxError::Io(err),
        }
    }
}

impl Default for TrapperTransport {
    fn default() -> Self {
        Self::new()
    }
}

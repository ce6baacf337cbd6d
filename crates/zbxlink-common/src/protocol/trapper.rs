use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Request discriminator the trapper listener expects for pushed values.
pub const SENDER_DATA_REQUEST: &str = "sender data";

/// One metric sample queued for transmission.
///
/// `value` is always carried as text; the sender never interprets it. `clock`
/// is a Unix timestamp in seconds and defaults to the moment the sample was
/// created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemValue {
    pub host: String,
    pub key: String,
    pub value: String,
    pub clock: i64,
}

impl ItemValue {
    pub fn new(host: impl Into<String>, key: impl Into<String>, value: impl ToString) -> Self {
        ItemValue {
            host: host.into(),
            key: key.into(),
            value: value.to_string(),
            clock: unix_timestamp(),
        }
    }

    pub fn with_clock(mut self, clock: i64) -> Self {
        self.clock = clock;
        self
    }
}

/// The pending batch in its serialized shape:
/// `{"request": "sender data", "data": [...]}`.
///
/// Insertion order of `data` is preserved on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderRequest {
    pub request: String,
    pub data: Vec<ItemValue>,
}

impl SenderRequest {
    pub fn new() -> Self {
        SenderRequest {
            request: SENDER_DATA_REQUEST.to_string(),
            data: Vec::new(),
        }
    }

    pub fn push(&mut self, value: ItemValue) {
        self.data.push(value);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for SenderRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds since the Unix epoch, saturating at 0 for a clock set before 1970.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

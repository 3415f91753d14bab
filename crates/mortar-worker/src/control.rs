#![forbid(unsafe_code)]

//! Control channel: typed messages posted by page contexts.
//!
//! Messages arrive as raw JSON tagged by a `type` field. Unrecognized types
//! must be ignored, never rejected: future pages will post message types
//! this worker has never heard of, and that must not crash it.
//!
//! Everything is fire-and-forget except the version queries, which reply
//! exactly once over a reply port supplied by the caller.

use serde::Deserialize;
use tokio::sync::oneshot;

/// Recognized control message types.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "REFRESH_MINIFIG_CACHE")]
    RefreshMinifigCache,
    #[serde(rename = "REFRESH_CSV_CACHE")]
    RefreshCsvCache,
    #[serde(rename = "REFRESH_API_CACHE")]
    RefreshApiCache,
    #[serde(rename = "GET_VERSION")]
    GetVersion,
    #[serde(rename = "GET_VERSION_INFO")]
    GetVersionInfo,
}

impl ControlMessage {
    /// Parse a posted message. `None` means "not for us": unknown type,
    /// missing tag, or not an object.
    #[must_use]
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// A posted message plus its optional reply port.
#[derive(Debug)]
pub struct ControlEnvelope {
    pub data: serde_json::Value,
    pub reply: Option<oneshot::Sender<serde_json::Value>>,
}

impl ControlEnvelope {
    /// Fire-and-forget message, no reply expected.
    #[must_use]
    pub fn new(data: serde_json::Value) -> Self {
        Self { data, reply: None }
    }

    /// Message with a reply port. The receiver resolves when the worker
    /// answers; it errors if the worker drops the port without replying
    /// (e.g. the message type carried no reply semantics).
    #[must_use]
    pub fn with_reply(data: serde_json::Value) -> (Self, oneshot::Receiver<serde_json::Value>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                data,
                reply: Some(tx),
            },
            rx,
        )
    }
}

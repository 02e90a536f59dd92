//! Wire types shared between the streaming engine and the WebSocket/HTTP
//! surface that drives it.
//!
//! All server-initiated WebSocket frames carry a `message_type` discriminator
//! so the browser can dispatch on a single tagged enum; see [`WsFrame`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message model
// ---------------------------------------------------------------------------

/// Which stream a message arrived on.
///
/// Serializes as the frozen `1`/`2` integer codes the wire protocol uses,
/// not as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Stdout,
    Stderr,
}

impl Serialize for LogType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(match self {
            LogType::Stdout => 1,
            LogType::Stderr => 2,
        })
    }
}

impl<'de> Deserialize<'de> for LogType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            1 => Ok(LogType::Stdout),
            2 => Ok(LogType::Stderr),
            other => Err(serde::de::Error::custom(format!(
                "invalid log_type {other}, expected 1 or 2"
            ))),
        }
    }
}

/// Where a message entered the engine. At most one field is populated;
/// all-blank means the message arrived directly (stdin, demo generator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOrigin {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub port: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_source: String,
}

impl MessageOrigin {
    pub fn is_blank(&self) -> bool {
        self.port.is_empty() && self.file.is_empty() && self.api_source.is_empty()
    }

    pub fn from_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn from_file(path: impl Into<String>) -> Self {
        Self {
            file: path.into(),
            ..Self::default()
        }
    }

    pub fn from_api_source(source: impl Into<String>) -> Self {
        Self {
            api_source: source.into(),
            ..Self::default()
        }
    }
}

/// A single retained log line, immutable once produced.
///
/// `id` is a base-10 rendering of a microsecond wall-clock timestamp,
/// assigned at ingress; it is a string (not an integer) because clients use
/// it as an opaque cursor anchor, not as an arithmetic quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_type: String,
    pub id: String,
    pub log_type: LogType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_content: Option<serde_json::Value>,
    pub is_json: bool,
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<MessageOrigin>,
}

impl Message {
    /// Build a message, inferring `is_json`/`json_content` from `content`.
    ///
    /// `origin` is collapsed to `None` when blank, matching the original's
    /// "all-blank means direct" convention.
    pub fn new(id: String, log_type: LogType, content: String, ts: i64, origin: MessageOrigin) -> Self {
        let json_content = serde_json::from_str::<serde_json::Value>(&content).ok();
        Self {
            message_type: "log".to_owned(),
            id,
            log_type,
            content,
            is_json: json_content.is_some(),
            json_content,
            ts,
            origin: if origin.is_blank() { None } else { Some(origin) },
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Global retention/throughput stats, recomputed on every ingest step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub max_count: u64,
    pub msg_count: u64,
    /// Epoch milliseconds of the first message ever ingested, or 0 if none yet.
    pub first_message_at: i64,
    /// Epoch milliseconds of the most recently ingested message, or 0 if none yet.
    pub last_message_at: i64,
}

/// Per-client delivery progress relative to the tail of the ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientStats {
    pub last_delivered_id: String,
    /// Logical ring index of `last_delivered_id`, or -1 if it has fallen out
    /// of retention (or nothing has been delivered yet).
    pub last_delivered_id_idx: i64,
    /// How many messages the client is behind the tail.
    pub count_to_tail: i64,
}

// ---------------------------------------------------------------------------
// Update checker
// ---------------------------------------------------------------------------

/// Result of comparing the running binary's version against the latest
/// published release. Absence of network access degrades this to `checked:
/// false` rather than surfacing an error to the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionUpdateInfo {
    pub checked: bool,
    pub local_version: String,
    pub current_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Server -> client WebSocket frames
// ---------------------------------------------------------------------------

/// Every WebSocket frame the server ever sends, tagged by `message_type`.
///
/// `Init` is actually delivered over HTTP (`GET /api/status`) rather than on
/// the socket, but it shares this enum because it shares the discriminator
/// convention and is serialized the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum WsFrame {
    #[serde(rename_all = "camelCase")]
    Init {
        analytics_enabled: bool,
        auth_required: bool,
        config_str: String,
        api_prefix: String,
        update_version: VersionUpdateInfo,
    },
    ClientJoined {
        client_id: String,
    },
    LogBulk {
        messages: Vec<Message>,
        status: Stats,
    },
    ClientMsgStatus {
        client: ClientStats,
        stats: Stats,
    },
}

// ---------------------------------------------------------------------------
// HTTP request/response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/client/peek-log`.
#[derive(Debug, Clone, Deserialize)]
pub struct PeekLogRequest {
    pub idxs: Vec<i64>,
}

/// One entry of `POST /api/log`'s `logs` array.
#[derive(Debug, Clone, Deserialize)]
pub struct LogIngestItem {
    /// Accepts RFC 3339 or a decimal millisecond integer; empty/absent means "now".
    #[serde(default)]
    pub ts: Option<String>,
    pub log: String,
}

/// Body of `POST /api/log`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogIngestRequest {
    #[serde(default)]
    pub source: String,
    pub logs: Vec<LogIngestItem>,
}

/// Uniform HTTP error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

//! The single front door every log producer pushes through.

use std::sync::Arc;

use logdy_protocol::{LogType, Message, MessageOrigin};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::{now_micros, now_ms, RotatingSink};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("engine has shut down")]
    ChannelClosed,
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("sink write failed: {0}")]
    Sink(#[from] crate::SinkError),
}

/// Either "use wall-clock time" or an explicit millisecond timestamp parsed
/// out of an ingest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSpec {
    Now,
    Explicit(i64),
}

/// Parse the optional `ts` field of an ingest item.
///
/// Accepts RFC 3339 (`2024-01-02T15:04:05Z`) or a decimal millisecond
/// integer; `None` or an empty string means "now".
pub fn parse_ingest_timestamp(raw: Option<&str>) -> Result<TimestampSpec, IngestError> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Ok(TimestampSpec::Now),
    };
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(TimestampSpec::Explicit(ms));
    }
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(TimestampSpec::Explicit(dt.timestamp_millis())),
        Err(_) => Err(IngestError::InvalidTimestamp(raw.to_owned())),
    }
}

/// Normalizes raw producer input into [`Message`]s and forwards them to the
/// engine's ingest channel, optionally mirroring each one to a rotating sink.
///
/// `strip_ansi` and `fallthrough` are fixed at construction: every source
/// adapter shares the same ingress instance, so these are process-wide
/// settings rather than per-call options.
pub struct Ingress {
    tx: mpsc::Sender<Message>,
    fallthrough: bool,
    strip_ansi: bool,
    sink: Option<Arc<Mutex<RotatingSink>>>,
}

impl Ingress {
    pub fn new(
        tx: mpsc::Sender<Message>,
        fallthrough: bool,
        strip_ansi: bool,
        sink: Option<Arc<Mutex<RotatingSink>>>,
    ) -> Self {
        Self {
            tx,
            fallthrough,
            strip_ansi,
            sink,
        }
    }

    /// Produce one message with the current wall-clock time.
    pub async fn produce(
        &self,
        content: impl Into<String>,
        log_type: LogType,
        origin: MessageOrigin,
    ) -> Result<(), IngestError> {
        self.produce_at(content, log_type, origin, TimestampSpec::Now).await
    }

    /// Produce one message with an explicit or wall-clock timestamp.
    pub async fn produce_at(
        &self,
        content: impl Into<String>,
        log_type: LogType,
        origin: MessageOrigin,
        ts: TimestampSpec,
    ) -> Result<(), IngestError> {
        let mut content = content.into();
        if self.strip_ansi {
            let stripped = strip_ansi_escapes::strip(content.as_bytes());
            if let Ok(s) = String::from_utf8(stripped) {
                content = s;
            }
        }

        if self.fallthrough {
            match log_type {
                LogType::Stdout => println!("{content}"),
                LogType::Stderr => eprintln!("{content}"),
            }
        }

        let ts_ms = match ts {
            TimestampSpec::Now => now_ms(),
            TimestampSpec::Explicit(ms) => ms,
        };
        let id = now_micros().to_string();
        let message = Message::new(id, log_type, content, ts_ms, origin);

        if let Some(sink) = &self.sink {
            let mut sink = sink.lock().await;
            sink.write_message(&message)?;
        }

        self.tx
            .send(message)
            .await
            .map_err(|_| IngestError::ChannelClosed)
    }
}

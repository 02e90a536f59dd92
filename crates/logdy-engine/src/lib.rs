//! The in-memory streaming engine: ingress, retention, and per-client fan-out.
//!
//! This crate owns no transport. `Ingress` is the single entry point
//! producers push into; `ClientsHub` is the single entry point sessions
//! (WebSocket or otherwise) drive.

mod client;
mod hub;
mod ingress;
mod sink;

pub use client::CursorState;
pub use hub::{ClientsHub, HubError};
pub use ingress::{parse_ingest_timestamp, IngestError, Ingress, TimestampSpec};
pub use sink::{RotatingSink, SinkError};

pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn now_micros() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

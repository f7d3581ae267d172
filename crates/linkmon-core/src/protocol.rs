//! Newline-delimited feed protocol.
//!
//! Compact relay lines carry the raw measurement stream; JSON lines carry
//! the richer payloads. One message per line, processed strictly in
//! arrival order:
//!
//! ```text
//! DATA:<rssi>,<rtt>,<count>
//! STATUS:CONNECTED | STATUS:DISCONNECTED
//! SNAPSHOT:{...}   STATS:{...}   WARN:{...}
//! ```
//!
//! The viewer may send the single control line `STATS` to request a fresh
//! aggregate payload.

use crate::events::{ConnectionStatus, Snapshot, StatsPayload, Warning};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown message kind in {0:?}")]
    UnknownKind(String),
    #[error("malformed DATA payload {0:?}")]
    BadData(String),
    #[error("unknown status {0:?}")]
    BadStatus(String),
    #[error("invalid JSON payload: {0}")]
    BadJson(#[from] serde_json::Error),
}

/// A decoded feed-to-viewer message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Data { rssi: i32, rtt: i32, count: u64 },
    Status(ConnectionStatus),
    Snapshot(Box<Snapshot>),
    Stats(StatsPayload),
    Warning(Warning),
}

/// Decode one line. Empty lines are not messages; a malformed line is an
/// error for the caller to log and skip, never a reason to drop the
/// connection.
pub fn parse_line(line: &str) -> Result<Option<FeedMessage>, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(payload) = line.strip_prefix("DATA:") {
        return parse_data(payload).map(Some);
    }
    if let Some(status) = line.strip_prefix("STATUS:") {
        return match status {
            "CONNECTED" => Ok(Some(FeedMessage::Status(ConnectionStatus::Connected))),
            "DISCONNECTED" => Ok(Some(FeedMessage::Status(ConnectionStatus::Disconnected))),
            other => Err(ProtocolError::BadStatus(other.into())),
        };
    }
    if let Some(json) = line.strip_prefix("SNAPSHOT:") {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        return Ok(Some(FeedMessage::Snapshot(Box::new(snapshot))));
    }
    if let Some(json) = line.strip_prefix("STATS:") {
        let payload: StatsPayload = serde_json::from_str(json)?;
        return Ok(Some(FeedMessage::Stats(payload)));
    }
    if let Some(json) = line.strip_prefix("WARN:") {
        let warning: Warning = serde_json::from_str(json)?;
        return Ok(Some(FeedMessage::Warning(warning)));
    }

    Err(ProtocolError::UnknownKind(line.into()))
}

fn parse_data(payload: &str) -> Result<FeedMessage, ProtocolError> {
    let mut parts = payload.split(',');
    let bad = || ProtocolError::BadData(payload.into());
    let rssi = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .ok_or_else(bad)?;
    let rtt = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .ok_or_else(bad)?;
    let count = parts
        .next()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .ok_or_else(bad)?;
    Ok(FeedMessage::Data { rssi, rtt, count })
}

pub fn encode_data(rssi: i32, rtt: i32, count: u64) -> String {
    format!("DATA:{rssi},{rtt},{count}")
}

pub fn encode_status(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => "STATUS:CONNECTED".into(),
        ConnectionStatus::Disconnected => "STATUS:DISCONNECTED".into(),
    }
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, ProtocolError> {
    Ok(format!("SNAPSHOT:{}", serde_json::to_string(snapshot)?))
}

pub fn encode_stats(payload: &StatsPayload) -> Result<String, ProtocolError> {
    Ok(format!("STATS:{}", serde_json::to_string(payload)?))
}

pub fn encode_warning(warning: &Warning) -> Result<String, ProtocolError> {
    Ok(format!("WARN:{}", serde_json::to_string(warning)?))
}

/// Viewer-to-feed control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    RequestStats,
}

pub fn parse_control(line: &str) -> Option<ControlMessage> {
    match line.trim() {
        "STATS" => Some(ControlMessage::RequestStats),
        _ => None,
    }
}

pub fn encode_control(message: ControlMessage) -> &'static str {
    match message {
        ControlMessage::RequestStats => "STATS",
    }
}

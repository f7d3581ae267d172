use crate::predictor::PredictorStatus;
use crate::quality::QualityLevel;
use crate::stats::{ChannelStatsSet, LinkIssues};
use serde::{Deserialize, Serialize};

/// Link state as reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }
}

/// Warning text as delivered on the wire: a single string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageSet {
    One(String),
    Many(Vec<String>),
}

impl MessageSet {
    pub fn joined(&self) -> String {
        match self {
            MessageSet::One(msg) => msg.clone(),
            MessageSet::Many(msgs) => msgs.join(", "),
        }
    }
}

impl From<Vec<String>> for MessageSet {
    fn from(messages: Vec<String>) -> Self {
        MessageSet::Many(messages)
    }
}

/// A predictor or system warning. Timestamps cross the wire as ISO-8601
/// strings, exactly as produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub timestamp: String,
    pub level: u8,
    pub messages: MessageSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Per-level warning totals for the counters row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WarningCounts {
    pub info: u64,
    pub caution: u64,
    pub warning: u64,
    pub critical: u64,
}

impl WarningCounts {
    pub fn increment(&mut self, level: u8) {
        match level {
            1 => self.info += 1,
            2 => self.caution += 1,
            3 => self.warning += 1,
            4 => self.critical += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.info + self.caution + self.warning + self.critical
    }
}

/// Observation counts per quality level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityDistribution {
    pub excellent: u64,
    pub good: u64,
    pub medium: u64,
    pub weak: u64,
    pub very_weak: u64,
}

impl QualityDistribution {
    pub fn increment(&mut self, level: QualityLevel) {
        *self.slot(level) += 1;
    }

    pub fn count(&self, level: QualityLevel) -> u64 {
        match level {
            QualityLevel::Excellent => self.excellent,
            QualityLevel::Good => self.good,
            QualityLevel::Medium => self.medium,
            QualityLevel::Weak => self.weak,
            QualityLevel::VeryWeak => self.very_weak,
        }
    }

    fn slot(&mut self, level: QualityLevel) -> &mut u64 {
        match level {
            QualityLevel::Excellent => &mut self.excellent,
            QualityLevel::Good => &mut self.good,
            QualityLevel::Medium => &mut self.medium,
            QualityLevel::Weak => &mut self.weak,
            QualityLevel::VeryWeak => &mut self.very_weak,
        }
    }
}

/// One point of series history inside a snapshot. The value is kept
/// loosely typed; the buffer re-parses and filters on ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSample {
    pub time: String,
    pub value: serde_json::Value,
}

/// Chart history carried by a snapshot, one list per channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesHistory {
    #[serde(default)]
    pub rssi: Vec<WireSample>,
    #[serde(default)]
    pub rtt: Vec<WireSample>,
}

/// Latest readings, as carried in snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentValues {
    pub rssi: Option<f64>,
    pub rtt: Option<f64>,
    pub latency: Option<f64>,
    pub quality: Option<QualityLevel>,
    pub count: u64,
}

/// Full feed state, sent once to each newly connected viewer. The only
/// event that may repopulate chart buffers wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_id: String,
    pub duration_seconds: f64,
    pub connection_status: Option<ConnectionStatus>,
    pub current: CurrentValues,
    pub stats: ChannelStatsSet,
    pub quality_distribution: QualityDistribution,
    pub issues: LinkIssues,
    #[serde(default)]
    pub warnings: Vec<Warning>,
    pub warning_counts: WarningCounts,
    pub predictor: PredictorStatus,
    pub chart_data: SeriesHistory,
}

/// One incremental measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_loss: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<Warning>,
}

impl Measurement {
    /// Expand a compact relay sample: one-way latency is half the round
    /// trip, quality is classified from signal strength.
    pub fn from_data(rssi: i32, rtt: i32, count: u64, timestamp: time::OffsetDateTime) -> Self {
        let rssi = f64::from(rssi);
        let quality = QualityLevel::from_rssi(rssi);
        Self {
            timestamp: crate::timeutils::format_rfc3339(timestamp),
            rssi: Some(rssi),
            rtt: Some(f64::from(rtt)),
            latency: Some((f64::from(rtt) / 2.0).floor()),
            quality: Some(quality),
            count: Some(count),
            packet_loss: None,
            warning: None,
        }
    }
}

/// Link came up or went down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ConnectionStatus,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnect_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<Warning>,
}

/// Aggregate refresh. Every field is optional; partial updates only touch
/// what they carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ChannelStatsSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_distribution: Option<QualityDistribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<LinkIssues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_counts: Option<WarningCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor: Option<PredictorStatus>,
}

/// Everything the reconciler consumes, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Snapshot(Box<Snapshot>),
    Sample(Measurement),
    Status(StatusChange),
    Warning(Warning),
    Stats(StatsPayload),
}

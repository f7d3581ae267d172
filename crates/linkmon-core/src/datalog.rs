use crate::events::{
    ConnectionStatus, CurrentValues, Measurement, MessageSet, QualityDistribution, SeriesHistory,
    Snapshot, StatsPayload, StatusChange, Warning, WarningCounts, WireSample,
};
use crate::predictor::{LinkPredictor, Thresholds, LEVEL_CRITICAL};
use crate::quality::QualityLevel;
use crate::series::TimeSeriesBuffer;
use crate::timeutils::{format_rfc3339, now_utc};
use std::collections::VecDeque;
use std::time::Instant;

/// History ring capacity on the feed side; viewers trim further to their
/// own chart capacity.
pub const HISTORY_CAPACITY: usize = 300;

const WARNING_FEED_LIMIT: usize = 50;

/// Session-wide accumulator on the feed side. Every measurement and status
/// transition passes through here; snapshots and stats payloads for the
/// wire are assembled from its state.
#[derive(Debug)]
pub struct DataLog {
    session_id: String,
    session_start: Instant,
    rssi_history: TimeSeriesBuffer,
    rtt_history: TimeSeriesBuffer,
    current: CurrentValues,
    accumulator: crate::stats::StatsAccumulator,
    quality_distribution: QualityDistribution,
    issues: crate::stats::IssueTracker,
    warnings: VecDeque<Warning>,
    warning_counts: WarningCounts,
    predictor: LinkPredictor,
    connection: ConnectionStatus,
}

impl DataLog {
    pub fn new(thresholds: Thresholds) -> Self {
        let format = time::macros::format_description!(
            "[year][month][day]_[hour][minute][second]"
        );
        let session_id = now_utc().format(&format).unwrap_or_else(|_| "session".into());
        Self {
            session_id,
            session_start: Instant::now(),
            rssi_history: TimeSeriesBuffer::new(HISTORY_CAPACITY),
            rtt_history: TimeSeriesBuffer::new(HISTORY_CAPACITY),
            current: CurrentValues::default(),
            accumulator: crate::stats::StatsAccumulator::new(),
            quality_distribution: QualityDistribution::default(),
            issues: crate::stats::IssueTracker::new(),
            warnings: VecDeque::new(),
            warning_counts: WarningCounts::default(),
            predictor: LinkPredictor::new(thresholds),
            connection: ConnectionStatus::Disconnected,
        }
    }

    /// Fold one relay measurement into the log and build the outbound
    /// sample event, including any warning the predictor raised for it.
    pub fn add_measurement(&mut self, rssi: i32, rtt: i32, count: u64) -> Measurement {
        let now = now_utc();
        let timestamp = format_rfc3339(now);
        let rssi_f = f64::from(rssi);
        let rtt_f = f64::from(rtt);
        let latency = (rtt_f / 2.0).floor();
        let quality = QualityLevel::from_rssi(rssi_f);

        // Gaps in the relay's measurement counter are lost packets.
        let mut packet_loss = 0;
        if self.current.count > 0 && count > self.current.count + 1 {
            packet_loss = count - self.current.count - 1;
            self.issues.record_gap(packet_loss);
        }

        self.current = CurrentValues {
            rssi: Some(rssi_f),
            rtt: Some(rtt_f),
            latency: Some(latency),
            quality: Some(quality),
            count,
        };

        self.rssi_history.push(now, rssi_f);
        self.rtt_history.push(now, rtt_f);
        self.accumulator.record(Some(rssi_f), Some(rtt_f), Some(latency));
        self.quality_distribution.increment(quality);

        let prediction =
            self.predictor
                .predict(Some(rssi_f), Some(rtt_f), Some(latency), Some(quality.score()));
        let warning = prediction.is_warning().then(|| {
            let warning = Warning {
                timestamp: timestamp.clone(),
                level: prediction.level,
                messages: MessageSet::from(prediction.messages.clone()),
                source: Some("rules".into()),
            };
            self.remember_warning(warning.clone());
            warning
        });

        Measurement {
            timestamp,
            rssi: Some(rssi_f),
            rtt: Some(rtt_f),
            latency: Some(latency),
            quality: Some(quality),
            count: Some(count),
            packet_loss: (packet_loss > 0).then_some(packet_loss),
            warning,
        }
    }

    /// The link to the measuring client went down. Synthesizes the
    /// critical system warning that accompanies the transition.
    pub fn set_disconnected(&mut self) -> StatusChange {
        let now = now_utc();
        self.connection = ConnectionStatus::Disconnected;
        self.issues.record_disconnect(now);

        let warning = Warning {
            timestamp: format_rfc3339(now),
            level: LEVEL_CRITICAL,
            messages: MessageSet::One("Link lost, no contact with the measuring client".into()),
            source: Some("system".into()),
        };
        self.remember_warning(warning.clone());

        StatusChange {
            status: ConnectionStatus::Disconnected,
            timestamp: format_rfc3339(now),
            disconnect_count: Some(self.issues.disconnects()),
            duration: None,
            warning: Some(warning),
        }
    }

    pub fn set_connected(&mut self) -> StatusChange {
        let now = now_utc();
        self.connection = ConnectionStatus::Connected;
        let duration = self.issues.record_reconnect(now);
        StatusChange {
            status: ConnectionStatus::Connected,
            timestamp: format_rfc3339(now),
            disconnect_count: Some(self.issues.disconnects()),
            duration,
            warning: None,
        }
    }

    fn remember_warning(&mut self, warning: Warning) {
        self.warning_counts.increment(warning.level);
        self.warnings.push_front(warning);
        self.warnings.truncate(WARNING_FEED_LIMIT);
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn measurement_count(&self) -> u64 {
        self.current.count
    }

    pub fn session_duration_secs(&self) -> f64 {
        self.session_start.elapsed().as_secs_f64()
    }

    /// Full state for a newly connected viewer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.session_id.clone(),
            duration_seconds: self.session_duration_secs(),
            connection_status: Some(self.connection),
            current: self.current,
            stats: self.accumulator.stats(),
            quality_distribution: self.quality_distribution,
            issues: self.issues.report(self.accumulator.observed()),
            warnings: self.warnings.iter().cloned().collect(),
            warning_counts: self.warning_counts,
            predictor: self.predictor.status(),
            chart_data: SeriesHistory {
                rssi: encode_history(&self.rssi_history),
                rtt: encode_history(&self.rtt_history),
            },
        }
    }

    /// Aggregate refresh for the stats_update path.
    pub fn stats_payload(&self) -> StatsPayload {
        StatsPayload {
            stats: Some(self.accumulator.stats()),
            quality_distribution: Some(self.quality_distribution),
            issues: Some(self.issues.report(self.accumulator.observed())),
            warning_counts: Some(self.warning_counts),
            predictor: Some(self.predictor.status()),
        }
    }
}

impl Default for DataLog {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

fn encode_history(buffer: &TimeSeriesBuffer) -> Vec<WireSample> {
    buffer
        .iter()
        .map(|sample| WireSample {
            time: format_rfc3339(sample.timestamp),
            value: serde_json::Value::from(sample.value),
        })
        .collect()
}

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Summary statistics for one metric channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub std: f64,
}

/// Which channel the stats table is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsChannel {
    Rssi,
    Rtt,
    Latency,
}

impl StatsChannel {
    pub fn label(self) -> &'static str {
        match self {
            StatsChannel::Rssi => "RSSI",
            StatsChannel::Rtt => "RTT",
            StatsChannel::Latency => "Latency",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            StatsChannel::Rssi => "dBm",
            StatsChannel::Rtt | StatsChannel::Latency => "ms",
        }
    }
}

/// Population statistics over every observed value of a channel. Averages
/// round to one decimal, standard deviation to two, as displayed.
pub fn compute_stats(values: &[f64]) -> ChannelStats {
    if values.is_empty() {
        return ChannelStats::default();
    }

    let n = values.len() as f64;
    let sorted: Vec<f64> = values.iter().copied().sorted_by(f64::total_cmp).collect();
    let avg = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    };

    ChannelStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        avg: round1(avg),
        median: round1(median),
        std: round2(variance.sqrt()),
    }
}

/// Stats for all three channels, as carried in snapshot and stats events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatsSet {
    pub rssi: ChannelStats,
    pub rtt: ChannelStats,
    pub latency: ChannelStats,
}

impl ChannelStatsSet {
    pub fn channel(&self, channel: StatsChannel) -> &ChannelStats {
        match channel {
            StatsChannel::Rssi => &self.rssi,
            StatsChannel::Rtt => &self.rtt,
            StatsChannel::Latency => &self.latency,
        }
    }
}

/// Retains every observed value per channel for session-wide statistics.
/// Unlike the chart buffers this is unbounded by design: it grows by one
/// float per channel per measurement for the life of the session.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    rssi: Vec<f64>,
    rtt: Vec<f64>,
    latency: Vec<f64>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rssi: Option<f64>, rtt: Option<f64>, latency: Option<f64>) {
        if let Some(v) = rssi.filter(|v| v.is_finite()) {
            self.rssi.push(v);
        }
        if let Some(v) = rtt.filter(|v| v.is_finite()) {
            self.rtt.push(v);
        }
        if let Some(v) = latency.filter(|v| v.is_finite()) {
            self.latency.push(v);
        }
    }

    pub fn observed(&self) -> u64 {
        self.rssi.len() as u64
    }

    pub fn stats(&self) -> ChannelStatsSet {
        ChannelStatsSet {
            rssi: compute_stats(&self.rssi),
            rtt: compute_stats(&self.rtt),
            latency: compute_stats(&self.latency),
        }
    }
}

/// Connection trouble counters, as carried in snapshot and stats events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkIssues {
    pub packet_loss: u64,
    pub packet_loss_rate: f64,
    pub disconnects: u64,
    pub total_downtime: f64,
    pub avg_disconnect: f64,
}

/// Tracks packet loss and disconnect history for the issues pane.
#[derive(Debug, Clone, Default)]
pub struct IssueTracker {
    lost_packets: u64,
    disconnects: u64,
    durations: Vec<f64>,
    last_disconnect: Option<OffsetDateTime>,
}

impl IssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_gap(&mut self, missing: u64) {
        self.lost_packets += missing;
    }

    pub fn record_disconnect(&mut self, now: OffsetDateTime) {
        self.disconnects += 1;
        self.last_disconnect = Some(now);
    }

    /// Close the open disconnect window, if any, returning its duration in
    /// seconds.
    pub fn record_reconnect(&mut self, now: OffsetDateTime) -> Option<f64> {
        let since = self.last_disconnect.take()?;
        let duration = (now - since).as_seconds_f64().max(0.0);
        self.durations.push(duration);
        Some(duration)
    }

    pub fn lost_packets(&self) -> u64 {
        self.lost_packets
    }

    pub fn disconnects(&self) -> u64 {
        self.disconnects
    }

    pub fn report(&self, observed: u64) -> LinkIssues {
        let total = observed + self.lost_packets;
        let rate = if total > 0 {
            round2(self.lost_packets as f64 / total as f64 * 100.0)
        } else {
            0.0
        };
        let downtime: f64 = self.durations.iter().sum();
        let avg = if self.durations.is_empty() {
            0.0
        } else {
            round1(downtime / self.durations.len() as f64)
        };
        LinkIssues {
            packet_loss: self.lost_packets,
            packet_loss_rate: rate,
            disconnects: self.disconnects,
            total_downtime: round1(downtime),
            avg_disconnect: avg,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

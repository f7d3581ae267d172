use crate::events::{
    ConnectionStatus, CurrentValues, LinkEvent, Measurement, QualityDistribution, Snapshot,
    StatsPayload, StatusChange, Warning, WarningCounts, WireSample,
};
use crate::gauge::{ArcGauge, GaugeSpec, QualityMeter, SignalBars};
use crate::predictor::PredictorStatus;
use crate::quality::QualityLevel;
use crate::series::{self, Sample, TimeSeriesBuffer};
use crate::stats::{ChannelStatsSet, LinkIssues};
use crate::timeutils::{now_utc, parse_rfc3339};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Chart points kept per channel unless configured otherwise.
pub const DEFAULT_CHART_CAPACITY: usize = 60;

/// Warnings retained in the feed pane.
pub const WARNING_FEED_LIMIT: usize = 50;

/// How long the warning indicator stays lit after a warning arrives.
pub const INDICATOR_HOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
struct Indicator {
    level: u8,
    deadline: Instant,
}

/// The dashboard context: owns every widget and buffer for the session and
/// reconciles the inbound event stream into them, strictly in arrival
/// order. Constructed once and passed to whatever drives the event loop;
/// there is no ambient state.
#[derive(Debug)]
pub struct Dashboard {
    signal_gauge: ArcGauge,
    latency_gauge: ArcGauge,
    signal_bars: SignalBars,
    quality_meter: QualityMeter,
    rssi_series: TimeSeriesBuffer,
    rtt_series: TimeSeriesBuffer,
    current: CurrentValues,
    stats: ChannelStatsSet,
    quality_distribution: QualityDistribution,
    issues: LinkIssues,
    warnings: VecDeque<Warning>,
    warning_counts: WarningCounts,
    predictor: PredictorStatus,
    connection: ConnectionStatus,
    disconnect_count: u64,
    indicator: Option<Indicator>,
    session_start: Instant,
    dirty: bool,
}

impl Dashboard {
    pub fn new(chart_capacity: usize) -> Self {
        Self {
            signal_gauge: ArcGauge::new(GaugeSpec::signal()),
            latency_gauge: ArcGauge::new(GaugeSpec::latency()),
            signal_bars: SignalBars::new(),
            quality_meter: QualityMeter::new(),
            rssi_series: TimeSeriesBuffer::new(chart_capacity),
            rtt_series: TimeSeriesBuffer::new(chart_capacity),
            current: CurrentValues::default(),
            stats: ChannelStatsSet::default(),
            quality_distribution: QualityDistribution::default(),
            issues: LinkIssues::default(),
            warnings: VecDeque::new(),
            warning_counts: WarningCounts::default(),
            predictor: PredictorStatus::default(),
            connection: ConnectionStatus::Disconnected,
            disconnect_count: 0,
            indicator: None,
            session_start: Instant::now(),
            dirty: true,
        }
    }

    /// Route one event into the dashboard state.
    pub fn apply(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Snapshot(snapshot) => self.apply_snapshot(*snapshot),
            LinkEvent::Sample(sample) => self.apply_sample(sample),
            LinkEvent::Status(status) => self.apply_status(status),
            LinkEvent::Warning(warning) => self.push_warning(warning),
            LinkEvent::Stats(payload) => self.apply_stats(payload),
        }
        self.dirty = true;
    }

    /// The only path that may repopulate the chart buffers wholesale.
    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.rssi_series
            .replace_all(decode_history(&snapshot.chart_data.rssi, false));
        self.rtt_series
            .replace_all(decode_history(&snapshot.chart_data.rtt, true));

        self.update_current(&snapshot.current);
        self.current.count = snapshot.current.count;

        self.stats = snapshot.stats;
        self.quality_distribution = snapshot.quality_distribution;
        self.issues = snapshot.issues;
        self.disconnect_count = snapshot.issues.disconnects;
        self.predictor = snapshot.predictor;
        self.warning_counts = snapshot.warning_counts;
        self.warnings = snapshot
            .warnings
            .into_iter()
            .take(WARNING_FEED_LIMIT)
            .collect();

        if let Some(status) = snapshot.connection_status {
            self.connection = status;
        }
    }

    fn apply_sample(&mut self, sample: Measurement) {
        let timestamp = parse_rfc3339(&sample.timestamp).unwrap_or_else(|_| now_utc());

        self.update_current(&CurrentValues {
            rssi: sample.rssi,
            rtt: sample.rtt,
            latency: sample.latency,
            quality: sample.quality,
            count: sample.count.unwrap_or(self.current.count),
        });

        if let Some(rssi) = sample.rssi {
            self.rssi_series.push(timestamp, rssi);
        }
        if let Some(rtt) = sample.rtt {
            // Round trips are physically non-negative; the transport may
            // deliver signed values, so coerce before the buffer sees them.
            self.rtt_series.push(timestamp, rtt.abs());
        }
        if let Some(count) = sample.count {
            self.current.count = count;
        }
        if let Some(warning) = sample.warning {
            self.push_warning(warning);
        }
    }

    /// Disconnection forces every live indicator to its floor; buffered
    /// history stays untouched.
    fn apply_status(&mut self, status: StatusChange) {
        self.connection = status.status;
        if let Some(count) = status.disconnect_count {
            self.disconnect_count = count;
        }
        if !status.status.is_connected() {
            self.signal_gauge.reset();
            self.latency_gauge.set_value(0.0);
            self.signal_bars.set_level(0);
            self.current.rssi = None;
            self.current.rtt = None;
            self.current.latency = None;
        }
        if let Some(warning) = status.warning {
            self.push_warning(warning);
        }
    }

    fn apply_stats(&mut self, payload: StatsPayload) {
        if let Some(stats) = payload.stats {
            self.stats = stats;
        }
        if let Some(distribution) = payload.quality_distribution {
            self.quality_distribution = distribution;
        }
        if let Some(issues) = payload.issues {
            self.issues = issues;
            self.disconnect_count = issues.disconnects;
        }
        if let Some(counts) = payload.warning_counts {
            self.warning_counts = counts;
        }
        if let Some(predictor) = payload.predictor {
            self.predictor = predictor;
        }
    }

    fn update_current(&mut self, values: &CurrentValues) {
        if let Some(rssi) = values.rssi.filter(|v| !v.is_nan()) {
            self.current.rssi = Some(rssi);
            self.signal_gauge.set_value(rssi);
            self.signal_bars.set_from_rssi(rssi);
        }
        if let Some(rtt) = values.rtt.filter(|v| !v.is_nan()) {
            let rtt = rtt.abs();
            self.current.rtt = Some(rtt);
            self.latency_gauge.set_value(rtt);
        }
        if let Some(latency) = values.latency.filter(|v| !v.is_nan()) {
            self.current.latency = Some(latency.abs());
        }
        if let Some(quality) = values.quality {
            self.current.quality = Some(quality);
            self.quality_meter.set_quality(quality);
        }
    }

    fn push_warning(&mut self, warning: Warning) {
        self.warning_counts.increment(warning.level);
        // A fresh warning replaces any pending hide deadline, so at most
        // one is armed at a time.
        self.indicator = Some(Indicator {
            level: warning.level,
            deadline: Instant::now() + INDICATOR_HOLD,
        });
        self.warnings.push_front(warning);
        self.warnings.truncate(WARNING_FEED_LIMIT);
    }

    /// Indicator level while its hold window is still open.
    pub fn active_indicator(&self) -> Option<u8> {
        self.indicator
            .filter(|i| Instant::now() < i.deadline)
            .map(|i| i.level)
    }

    /// True once since the last redraw-worthy mutation.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn session_duration(&self) -> Duration {
        self.session_start.elapsed()
    }

    pub fn signal_gauge(&self) -> &ArcGauge {
        &self.signal_gauge
    }

    pub fn latency_gauge(&self) -> &ArcGauge {
        &self.latency_gauge
    }

    pub fn signal_bars(&self) -> &SignalBars {
        &self.signal_bars
    }

    pub fn quality_meter(&self) -> &QualityMeter {
        &self.quality_meter
    }

    pub fn rssi_series(&self) -> &TimeSeriesBuffer {
        &self.rssi_series
    }

    pub fn rtt_series(&self) -> &TimeSeriesBuffer {
        &self.rtt_series
    }

    pub fn current(&self) -> &CurrentValues {
        &self.current
    }

    pub fn stats(&self) -> &ChannelStatsSet {
        &self.stats
    }

    pub fn quality_distribution(&self) -> &QualityDistribution {
        &self.quality_distribution
    }

    pub fn issues(&self) -> &LinkIssues {
        &self.issues
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub fn warning_counts(&self) -> &WarningCounts {
        &self.warning_counts
    }

    pub fn predictor(&self) -> &PredictorStatus {
        &self.predictor
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn disconnect_count(&self) -> u64 {
        self.disconnect_count
    }

    pub fn measurement_count(&self) -> u64 {
        self.current.count
    }

    /// Current quality level, falling back to classifying the last signal
    /// reading when no explicit quality has arrived.
    pub fn quality(&self) -> Option<QualityLevel> {
        self.quality_meter
            .level()
            .or_else(|| self.current.rssi.map(QualityLevel::from_rssi))
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_CAPACITY)
    }
}

fn decode_history(history: &[WireSample], coerce_abs: bool) -> Vec<Sample> {
    history
        .iter()
        .filter_map(|ws| decode_wire_sample(ws, coerce_abs))
        .collect()
}

fn decode_wire_sample(ws: &WireSample, coerce_abs: bool) -> Option<Sample> {
    let timestamp = match parse_rfc3339(&ws.time) {
        Ok(ts) => ts,
        Err(_) => {
            debug!(time = %ws.time, "skipping history sample with bad timestamp");
            return None;
        }
    };
    let value = series::parse_value(&ws.value)?;
    Some(Sample::new(
        timestamp,
        if coerce_abs { value.abs() } else { value },
    ))
}

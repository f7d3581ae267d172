pub mod color;
pub mod config;
pub mod datalog;
pub mod events;
pub mod gauge;
pub mod predictor;
pub mod protocol;
pub mod quality;
pub mod reconcile;
pub mod series;
pub mod stats;
pub mod timeutils;

pub use color::{color_at, ColorStop, Rgb};
pub use config::{Config, FeedConfig, LoggingConfig, ViewerConfig};
pub use datalog::DataLog;
pub use events::{
    ConnectionStatus, CurrentValues, LinkEvent, Measurement, MessageSet, QualityDistribution,
    Snapshot, StatsPayload, StatusChange, Warning, WarningCounts,
};
pub use gauge::{ArcGauge, GaugeRange, GaugeSpec, QualityMeter, SignalBars};
pub use predictor::{LinkPredictor, PredictorStatus, Thresholds};
pub use protocol::{ControlMessage, FeedMessage, ProtocolError};
pub use quality::QualityLevel;
pub use reconcile::Dashboard;
pub use series::{Sample, TimeSeriesBuffer};
pub use stats::{ChannelStats, ChannelStatsSet, LinkIssues, StatsChannel};
pub use timeutils::{clock_label, format_session_duration, now_utc, parse_rfc3339};

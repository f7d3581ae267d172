use crate::quality::QualityLevel;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const LEVEL_NONE: u8 = 0;
pub const LEVEL_INFO: u8 = 1;
pub const LEVEL_CAUTION: u8 = 2;
pub const LEVEL_WARNING: u8 = 3;
pub const LEVEL_CRITICAL: u8 = 4;

pub fn level_label(level: u8) -> &'static str {
    match level {
        LEVEL_INFO => "info",
        LEVEL_CAUTION => "caution",
        LEVEL_WARNING => "warning",
        LEVEL_CRITICAL => "critical",
        _ => "none",
    }
}

/// Tunable limits for the rule engine. All fields default to the values
/// the rules were calibrated with; a config file can override any subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rssi_warning: f64,
    pub rssi_critical: f64,
    pub rssi_danger: f64,
    pub rssi_trend_warning: f64,
    pub rssi_trend_critical: f64,
    pub rssi_std_warning: f64,
    pub rtt_warning: f64,
    pub rtt_critical: f64,
    pub rtt_trend_warning: f64,
    pub latency_warning: f64,
    pub latency_critical: f64,
    pub quality_drop_warning: i32,
    pub quality_drop_critical: i32,
    pub window_size: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rssi_warning: -60.0,
            rssi_critical: -75.0,
            rssi_danger: -85.0,
            rssi_trend_warning: -3.0,
            rssi_trend_critical: -5.0,
            rssi_std_warning: 5.0,
            rtt_warning: 100.0,
            rtt_critical: 200.0,
            rtt_trend_warning: 20.0,
            latency_warning: 50.0,
            latency_critical: 100.0,
            quality_drop_warning: 1,
            quality_drop_critical: 2,
            window_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    rssi: Option<f64>,
    rtt: Option<f64>,
    latency: Option<f64>,
    quality_score: Option<u8>,
}

/// Outcome of one prediction pass: the highest warning level any rule
/// reached, with one message per firing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub level: u8,
    pub messages: Vec<String>,
}

impl Prediction {
    pub fn is_warning(&self) -> bool {
        self.level > LEVEL_NONE
    }
}

/// Counters for the predictor status pane, as carried on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorStatus {
    pub mode: String,
    pub total_predictions: u64,
    pub warnings_given: u64,
}

const MAX_HISTORY: usize = 20;

/// Rule-based early-warning engine. Evaluates each measurement against
/// absolute limits, short-window trends and stability, and escalates to
/// the highest level that fires.
#[derive(Debug, Clone)]
pub struct LinkPredictor {
    thresholds: Thresholds,
    history: VecDeque<Observation>,
    total_predictions: u64,
    warnings_given: u64,
}

impl LinkPredictor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            history: VecDeque::with_capacity(MAX_HISTORY),
            total_predictions: 0,
            warnings_given: 0,
        }
    }

    pub fn status(&self) -> PredictorStatus {
        PredictorStatus {
            mode: "rules".into(),
            total_predictions: self.total_predictions,
            warnings_given: self.warnings_given,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn remember(&mut self, obs: Observation) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(obs);
    }

    /// Last `window_size` values of a channel, oldest first.
    fn window<F>(&self, pick: F) -> Vec<f64>
    where
        F: Fn(&Observation) -> Option<f64>,
    {
        if self.history.len() < self.thresholds.window_size {
            return Vec::new();
        }
        self.history
            .iter()
            .skip(self.history.len() - self.thresholds.window_size)
            .filter_map(pick)
            .collect()
    }

    fn rssi_trend_and_delta(&self) -> (f64, f64) {
        let values = self.window(|o| o.rssi);
        if values.len() < 2 {
            return (0.0, 0.0);
        }
        let delta = values[values.len() - 1] - values[0];
        (delta / (values.len() - 1) as f64, delta)
    }

    fn rssi_std(&self) -> f64 {
        let values = self.window(|o| o.rssi);
        if values.len() < 2 {
            return 0.0;
        }
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }

    fn rtt_trend(&self) -> f64 {
        let values: Vec<f64> = self
            .window(|o| o.rtt)
            .into_iter()
            .filter(|v| *v > 0.0)
            .collect();
        if values.len() < 2 {
            return 0.0;
        }
        values[values.len() - 1] - values[0]
    }

    fn quality_trend(&self) -> i32 {
        let values = self.window(|o| o.quality_score.map(f64::from));
        if values.len() < 2 {
            return 0;
        }
        (values[values.len() - 1] - values[0]) as i32
    }

    /// Evaluate one measurement. The observation joins the history window
    /// first, so trends include the value being judged.
    pub fn predict(
        &mut self,
        rssi: Option<f64>,
        rtt: Option<f64>,
        latency: Option<f64>,
        quality_score: Option<u8>,
    ) -> Prediction {
        self.total_predictions += 1;
        if rssi.is_some() {
            self.remember(Observation {
                rssi,
                rtt,
                latency,
                quality_score,
            });
        }

        let t = self.thresholds;
        let mut level = LEVEL_NONE;
        let mut messages = Vec::new();

        if let Some(rssi) = rssi {
            if rssi < t.rssi_danger {
                messages.push(format!(
                    "Signal very weak ({rssi:.0} dBm), the link may drop at any moment"
                ));
                level = level.max(LEVEL_CRITICAL);
            } else if rssi < t.rssi_critical {
                messages.push(format!(
                    "Signal at critical level ({rssi:.0} dBm), disconnect risk is high"
                ));
                level = level.max(LEVEL_WARNING);
            } else if rssi < t.rssi_warning {
                messages.push(format!(
                    "Signal strength low ({rssi:.0} dBm), link quality degrading"
                ));
                level = level.max(LEVEL_CAUTION);
            }
        }

        let (trend, delta) = self.rssi_trend_and_delta();
        if trend < t.rssi_trend_critical {
            messages.push(format!(
                "Signal dropping fast: {:.0} dBm lost over the last {} samples",
                delta.abs(),
                t.window_size
            ));
            level = level.max(LEVEL_WARNING);
        } else if trend < t.rssi_trend_warning {
            messages.push(format!(
                "Signal trending down: {:.0} dBm over the last {} samples",
                delta.abs(),
                t.window_size
            ));
            level = level.max(LEVEL_CAUTION);
        } else if trend < -1.0 && level == LEVEL_NONE {
            messages.push(format!(
                "Minor signal fluctuation ({:.0} dBm change)",
                delta.abs()
            ));
            level = level.max(LEVEL_INFO);
        }

        let std = self.rssi_std();
        if std > t.rssi_std_warning {
            messages.push(format!("Signal unstable, fluctuation is +/-{std:.1} dBm"));
            level = level.max(LEVEL_CAUTION);
        }

        if let Some(rtt) = rtt.filter(|v| *v > 0.0) {
            if rtt > t.rtt_critical {
                messages.push(format!(
                    "Round-trip time very high ({rtt:.0} ms), possible congestion or packet loss"
                ));
                level = level.max(LEVEL_WARNING);
            } else if rtt > t.rtt_warning {
                messages.push(format!("Round-trip time above normal ({rtt:.0} ms)"));
                level = level.max(LEVEL_CAUTION);
            }
        }

        let rtt_trend = self.rtt_trend();
        if rtt_trend > t.rtt_trend_warning {
            messages.push(format!("Round-trip time rising (+{rtt_trend:.0} ms)"));
            level = level.max(LEVEL_CAUTION);
        }

        if let Some(latency) = latency.filter(|v| *v > 0.0) {
            if latency > t.latency_critical {
                messages.push(format!("One-way latency critical ({latency:.0} ms)"));
                level = level.max(LEVEL_WARNING);
            } else if latency > t.latency_warning {
                messages.push(format!("One-way latency elevated ({latency:.0} ms)"));
                level = level.max(LEVEL_CAUTION);
            }
        }

        let quality_trend = self.quality_trend();
        if quality_trend <= -t.quality_drop_critical {
            messages.push(quality_drop_message(quality_score, quality_trend, true));
            level = level.max(LEVEL_WARNING);
        } else if quality_trend <= -t.quality_drop_warning {
            messages.push(quality_drop_message(quality_score, quality_trend, false));
            level = level.max(LEVEL_CAUTION);
        }

        if level > LEVEL_NONE {
            self.warnings_given += 1;
        }
        Prediction { level, messages }
    }
}

impl Default for LinkPredictor {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

fn quality_drop_message(score: Option<u8>, trend: i32, fast: bool) -> String {
    let transition = score.and_then(|new| {
        let old = i32::from(new) - trend;
        let old = QualityLevel::from_score(u8::try_from(old).ok()?)?;
        let new = QualityLevel::from_score(new)?;
        Some(format!("{old} -> {new}"))
    });
    match (transition, fast) {
        (Some(t), true) => format!("Link quality fell fast: {t}"),
        (Some(t), false) => format!("Link quality falling: {t}"),
        (None, true) => "Link quality is falling fast".into(),
        (None, false) => "Link quality trending down".into(),
    }
}

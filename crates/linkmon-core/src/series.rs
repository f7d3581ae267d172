use crate::timeutils::clock_label;
use std::collections::VecDeque;
use time::OffsetDateTime;
use tracing::debug;

/// One charted measurement. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: OffsetDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: OffsetDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity sliding window of samples. Oldest entries are evicted
/// first once the window is full, so memory stays bounded no matter how
/// long the stream runs.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    discarded: u64,
}

impl TimeSeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be positive");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            discarded: 0,
        }
    }

    /// Append a sample, evicting the head if the window is full. A
    /// non-finite value is dropped and counted, never an error: the stream
    /// is live and occasionally noisy.
    pub fn push(&mut self, timestamp: OffsetDateTime, value: f64) {
        if !value.is_finite() {
            self.discarded += 1;
            debug!(?value, "discarding non-finite sample");
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample::new(timestamp, value));
    }

    /// Append a loosely-typed value as delivered on the wire: numbers pass
    /// through, numeric strings are parsed, anything else is dropped.
    pub fn push_raw(&mut self, timestamp: OffsetDateTime, raw: &serde_json::Value) {
        match parse_value(raw) {
            Some(value) => self.push(timestamp, value),
            None => {
                self.discarded += 1;
                debug!(%raw, "discarding non-numeric sample");
            }
        }
    }

    /// Replace the whole window with the last `capacity` valid entries of
    /// `samples`, in order. Earlier entries and non-finite values are
    /// dropped. The swap is atomic: the old contents stay visible until the
    /// new set is complete.
    pub fn replace_all<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Sample>,
    {
        let valid: Vec<Sample> = samples
            .into_iter()
            .filter(|s| {
                if s.value.is_finite() {
                    true
                } else {
                    self.discarded += 1;
                    false
                }
            })
            .collect();
        let skip = valid.len().saturating_sub(self.capacity);
        self.samples = valid.into_iter().skip(skip).collect();
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples dropped so far for being non-numeric or non-finite.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Projection for a rendering surface: parallel label and value
    /// sequences in insertion order.
    pub fn to_series(&self) -> (Vec<String>, Vec<f64>) {
        let labels = self.samples.iter().map(|s| clock_label(s.timestamp)).collect();
        let values = self.samples.iter().map(|s| s.value).collect();
        (labels, values)
    }
}

/// `parseFloat`-style leniency for wire values: JSON numbers and numeric
/// strings are accepted, everything else is not a sample.
pub fn parse_value(raw: &serde_json::Value) -> Option<f64> {
    let value = match raw {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

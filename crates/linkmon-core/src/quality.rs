use crate::color::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discretized link quality, ordered worst to best. The score is the value
/// shown in the quality meter and fed to the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityLevel {
    VeryWeak,
    Weak,
    Medium,
    Good,
    Excellent,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 5] = [
        QualityLevel::Excellent,
        QualityLevel::Good,
        QualityLevel::Medium,
        QualityLevel::Weak,
        QualityLevel::VeryWeak,
    ];

    /// Classify a signal strength reading in dBm.
    pub fn from_rssi(rssi: f64) -> Self {
        if rssi >= -50.0 {
            QualityLevel::Excellent
        } else if rssi >= -60.0 {
            QualityLevel::Good
        } else if rssi >= -70.0 {
            QualityLevel::Medium
        } else if rssi >= -80.0 {
            QualityLevel::Weak
        } else {
            QualityLevel::VeryWeak
        }
    }

    pub fn score(self) -> u8 {
        match self {
            QualityLevel::Excellent => 4,
            QualityLevel::Good => 3,
            QualityLevel::Medium => 2,
            QualityLevel::Weak => 1,
            QualityLevel::VeryWeak => 0,
        }
    }

    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            4 => Some(QualityLevel::Excellent),
            3 => Some(QualityLevel::Good),
            2 => Some(QualityLevel::Medium),
            1 => Some(QualityLevel::Weak),
            0 => Some(QualityLevel::VeryWeak),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "Excellent",
            QualityLevel::Good => "Good",
            QualityLevel::Medium => "Medium",
            QualityLevel::Weak => "Weak",
            QualityLevel::VeryWeak => "Very weak",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            QualityLevel::Excellent => Rgb::new(0x3f, 0xb9, 0x50),
            QualityLevel::Good => Rgb::new(0x7e, 0xe7, 0x87),
            QualityLevel::Medium => Rgb::new(0xd2, 0x99, 0x22),
            QualityLevel::Weak => Rgb::new(0xf0, 0x88, 0x3e),
            QualityLevel::VeryWeak => Rgb::new(0xf8, 0x51, 0x49),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            anyhow::bail!("expected #rrggbb, got {s:?}");
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        Ok(Self { r, g, b })
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of a color scale. Stop lists are sorted ascending by offset,
/// with the first at 0.0 and the last at 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(offset: f64, color: Rgb) -> Self {
        Self { offset, color }
    }
}

/// Interpolated color for a normalized position on the scale.
///
/// Finds the bracketing pair of stops scanning ascending; positions outside
/// the endpoint offsets clamp to the nearest endpoint stop. An empty stop
/// list is a precondition violation and falls back to `Rgb::default()`.
pub fn color_at(percentage: f64, stops: &[ColorStop]) -> Rgb {
    let Some(first) = stops.first() else {
        return Rgb::default();
    };
    let last = stops[stops.len() - 1];

    let mut lower = *first;
    let mut upper = last;
    for pair in stops.windows(2) {
        if percentage >= pair[0].offset && percentage <= pair[1].offset {
            lower = pair[0];
            upper = pair[1];
            break;
        }
    }

    let range = upper.offset - lower.offset;
    let factor = if range > 0.0 {
        ((percentage - lower.offset) / range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    lerp(lower.color, upper.color, factor)
}

fn lerp(a: Rgb, b: Rgb, factor: f64) -> Rgb {
    Rgb {
        r: lerp_channel(a.r, b.r, factor),
        g: lerp_channel(a.g, b.g, factor),
        b: lerp_channel(a.b, b.b, factor),
    }
}

fn lerp_channel(a: u8, b: u8, factor: f64) -> u8 {
    let value = f64::from(a) + (f64::from(b) - f64::from(a)) * factor;
    value.round().clamp(0.0, 255.0) as u8
}

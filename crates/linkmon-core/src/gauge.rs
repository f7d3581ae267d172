use crate::color::{color_at, ColorStop, Rgb};
use crate::quality::QualityLevel;

/// Fixed drawing geometry shared by every arc gauge surface.
pub const VIEW_WIDTH: f64 = 180.0;
pub const VIEW_HEIGHT: f64 = 140.0;
pub const CENTER_X: f64 = 90.0;
pub const CENTER_Y: f64 = 85.0;
pub const RADIUS: f64 = 70.0;
pub const ARC_WIDTH: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Polar to cartesian with the gauge convention: angle in degrees measured
/// clockwise from vertical (the 90-degree shift happens before the radian
/// conversion).
pub fn polar_to_cartesian(cx: f64, cy: f64, radius: f64, angle_degrees: f64) -> Point {
    let angle_radians = (angle_degrees - 90.0).to_radians();
    Point {
        x: cx + radius * angle_radians.cos(),
        y: cy + radius * angle_radians.sin(),
    }
}

/// Geometric description of a partial circular arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub start: Point,
    pub end: Point,
    pub large_arc: bool,
}

impl ArcPath {
    /// SVG path data for this arc, drawn counter-clockwise from the end
    /// point back to the start point as the original surface did.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} A {} {} 0 {} 0 {} {}",
            self.start.x,
            self.start.y,
            self.radius,
            self.radius,
            u8::from(self.large_arc),
            self.end.x,
            self.end.y,
        )
    }
}

/// Arc from `start_angle` to `end_angle` around a fixed center. The
/// large-arc flag is set once the angular span exceeds 180 degrees.
pub fn describe_arc(cx: f64, cy: f64, radius: f64, start_angle: f64, end_angle: f64) -> ArcPath {
    ArcPath {
        center: Point { x: cx, y: cy },
        radius,
        start_angle,
        end_angle,
        start: polar_to_cartesian(cx, cy, radius, end_angle),
        end: polar_to_cartesian(cx, cy, radius, start_angle),
        large_arc: end_angle - start_angle > 180.0,
    }
}

/// Numeric range of a gauge; values are clamped into it before rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeRange {
    pub min: f64,
    pub max: f64,
}

impl GaugeRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn percentage(&self, value: f64) -> f64 {
        (self.clamp(value) - self.min) / (self.max - self.min)
    }
}

/// Everything that distinguishes one gauge from another: range, angular
/// span and color semantics. Variants are constants, not subtypes.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSpec {
    pub range: GaugeRange,
    pub start_angle: f64,
    pub end_angle: f64,
    pub stops: Vec<ColorStop>,
    pub unit: &'static str,
    pub label: &'static str,
}

impl GaugeSpec {
    /// Signal strength in dBm. Lower (more negative) readings are bad, so
    /// the stops run red at -100 up to green at -20: the scale is ordered
    /// by quality, not by raw sign.
    pub fn signal() -> Self {
        Self {
            range: GaugeRange::new(-100.0, -20.0),
            start_angle: -135.0,
            end_angle: 135.0,
            stops: vec![
                ColorStop::new(0.0, Rgb::new(0xf8, 0x51, 0x49)),
                ColorStop::new(0.3, Rgb::new(0xf0, 0x88, 0x3e)),
                ColorStop::new(0.5, Rgb::new(0xd2, 0x99, 0x22)),
                ColorStop::new(0.75, Rgb::new(0x7e, 0xe7, 0x87)),
                ColorStop::new(1.0, Rgb::new(0x3f, 0xb9, 0x50)),
            ],
            unit: "dBm",
            label: "RSSI",
        }
    }

    /// Round-trip latency in milliseconds, inverted relative to the signal
    /// gauge: low is good.
    pub fn latency() -> Self {
        Self {
            range: GaugeRange::new(0.0, 100.0),
            start_angle: -135.0,
            end_angle: 135.0,
            stops: vec![
                ColorStop::new(0.0, Rgb::new(0x3f, 0xb9, 0x50)),
                ColorStop::new(0.3, Rgb::new(0x7e, 0xe7, 0x87)),
                ColorStop::new(0.5, Rgb::new(0xd2, 0x99, 0x22)),
                ColorStop::new(0.7, Rgb::new(0xf0, 0x88, 0x3e)),
                ColorStop::new(1.0, Rgb::new(0xf8, 0x51, 0x49)),
            ],
            unit: "ms",
            label: "RTT",
        }
    }
}

/// Rendered state of a gauge at its current value, consumed by a surface's
/// `render` implementation (SVG path, terminal canvas, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeFrame {
    pub value: f64,
    pub percentage: f64,
    pub target_angle: f64,
    pub path: ArcPath,
    pub color: Rgb,
}

/// A radial meter mapping a scalar onto a partial arc with a
/// value-dependent stroke color.
#[derive(Debug, Clone)]
pub struct ArcGauge {
    spec: GaugeSpec,
    value: f64,
}

impl ArcGauge {
    pub fn new(spec: GaugeSpec) -> Self {
        let value = spec.range.min;
        Self { spec, value }
    }

    pub fn spec(&self) -> &GaugeSpec {
        &self.spec
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Update the gauge. NaN readings are not an update: the previous value
    /// stays on screen.
    pub fn set_value(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.value = self.spec.range.clamp(value);
    }

    pub fn reset(&mut self) {
        self.value = self.spec.range.min;
    }

    pub fn percentage(&self) -> f64 {
        self.spec.range.percentage(self.value)
    }

    pub fn color(&self) -> Rgb {
        color_at(self.percentage(), &self.spec.stops)
    }

    /// Arc parameters and stroke color for the current value.
    pub fn frame(&self) -> GaugeFrame {
        let percentage = self.percentage();
        let span = self.spec.end_angle - self.spec.start_angle;
        let target_angle = self.spec.start_angle + span * percentage;
        GaugeFrame {
            value: self.value,
            percentage,
            target_angle,
            path: describe_arc(CENTER_X, CENTER_Y, RADIUS, self.spec.start_angle, target_angle),
            color: color_at(percentage, &self.spec.stops),
        }
    }
}

/// Discrete signal level meter, 0 to 5 bars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalBars {
    level: u8,
}

pub const BAR_COUNT: u8 = 5;

impl SignalBars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(BAR_COUNT);
    }

    /// Map a raw strength reading onto a bar count.
    pub fn set_from_rssi(&mut self, rssi: f64) -> u8 {
        let level = if rssi >= -50.0 {
            5
        } else if rssi >= -60.0 {
            4
        } else if rssi >= -70.0 {
            3
        } else if rssi >= -80.0 {
            2
        } else if rssi >= -90.0 {
            1
        } else {
            0
        };
        self.level = level;
        level
    }
}

/// Current quality level readout with a 0..1 fill fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityMeter {
    level: Option<QualityLevel>,
}

impl QualityMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quality(&mut self, level: QualityLevel) {
        self.level = Some(level);
    }

    pub fn clear(&mut self) {
        self.level = None;
    }

    pub fn level(&self) -> Option<QualityLevel> {
        self.level
    }

    pub fn score(&self) -> Option<u8> {
        self.level.map(QualityLevel::score)
    }

    pub fn fill(&self) -> f64 {
        match self.level {
            Some(level) => f64::from(level.score()) / 4.0,
            None => 0.0,
        }
    }
}

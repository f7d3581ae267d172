use linkmon_core::gauge::{describe_arc, polar_to_cartesian, QualityMeter, SignalBars};
use linkmon_core::{ArcGauge, GaugeSpec, QualityLevel, Rgb};

#[test]
fn values_clamp_to_range() {
    let mut gauge = ArcGauge::new(GaugeSpec::signal());
    gauge.set_value(-250.0);
    let low = gauge.frame();
    gauge.set_value(-100.0);
    assert_eq!(gauge.frame(), low);

    gauge.set_value(10.0);
    let high = gauge.frame();
    gauge.set_value(-20.0);
    assert_eq!(gauge.frame(), high);
}

#[test]
fn nan_is_not_an_update() {
    let mut gauge = ArcGauge::new(GaugeSpec::latency());
    gauge.set_value(40.0);
    gauge.set_value(f64::NAN);
    assert_eq!(gauge.value(), 40.0);
}

#[test]
fn signal_midpoint_hits_exact_stop_color() {
    let mut gauge = ArcGauge::new(GaugeSpec::signal());
    gauge.set_value(-60.0);
    let frame = gauge.frame();
    assert!((frame.percentage - 0.5).abs() < f64::EPSILON);
    assert_eq!(frame.color, Rgb::new(0xd2, 0x99, 0x22));
}

#[test]
fn latency_scale_is_inverted() {
    let mut gauge = ArcGauge::new(GaugeSpec::latency());
    gauge.set_value(0.0);
    let good = gauge.frame().color;
    gauge.set_value(100.0);
    let bad = gauge.frame().color;
    assert_eq!(good, Rgb::new(0x3f, 0xb9, 0x50));
    assert_eq!(bad, Rgb::new(0xf8, 0x51, 0x49));
}

#[test]
fn target_angle_spans_the_arc() {
    let mut gauge = ArcGauge::new(GaugeSpec::signal());
    gauge.set_value(-100.0);
    assert!((gauge.frame().target_angle - -135.0).abs() < 1e-9);
    gauge.set_value(-20.0);
    assert!((gauge.frame().target_angle - 135.0).abs() < 1e-9);
}

#[test]
fn polar_is_clockwise_from_vertical() {
    // 0 degrees points straight up from the center.
    let top = polar_to_cartesian(0.0, 0.0, 10.0, 0.0);
    assert!(top.x.abs() < 1e-9);
    assert!((top.y + 10.0).abs() < 1e-9);

    // 90 degrees points right.
    let right = polar_to_cartesian(0.0, 0.0, 10.0, 90.0);
    assert!((right.x - 10.0).abs() < 1e-9);
    assert!(right.y.abs() < 1e-9);
}

#[test]
fn large_arc_flag_set_past_half_turn() {
    assert!(describe_arc(90.0, 85.0, 70.0, -135.0, 135.0).large_arc);
    assert!(!describe_arc(90.0, 85.0, 70.0, -135.0, 0.0).large_arc);
}

#[test]
fn svg_path_mentions_radius_and_flag() {
    let arc = describe_arc(90.0, 85.0, 70.0, -135.0, 135.0);
    let path = arc.svg_path();
    assert!(path.starts_with("M "));
    assert!(path.contains(" A 70 70 0 1 0 "));
}

#[test]
fn quality_meter_fills_by_score() {
    let mut meter = QualityMeter::new();
    assert_eq!(meter.fill(), 0.0);
    meter.set_quality(QualityLevel::Good);
    assert_eq!(meter.score(), Some(3));
    assert_eq!(meter.fill(), 0.75);
    meter.clear();
    assert_eq!(meter.level(), None);
}

#[test]
fn signal_bars_follow_thresholds() {
    let mut bars = SignalBars::new();
    assert_eq!(bars.set_from_rssi(-45.0), 5);
    assert_eq!(bars.set_from_rssi(-55.0), 4);
    assert_eq!(bars.set_from_rssi(-65.0), 3);
    assert_eq!(bars.set_from_rssi(-75.0), 2);
    assert_eq!(bars.set_from_rssi(-85.0), 1);
    assert_eq!(bars.set_from_rssi(-95.0), 0);
}

use linkmon_core::{color_at, ColorStop, Rgb};

fn scale() -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.0, Rgb::new(0xf8, 0x51, 0x49)),
        ColorStop::new(0.5, Rgb::new(0xd2, 0x99, 0x22)),
        ColorStop::new(1.0, Rgb::new(0x3f, 0xb9, 0x50)),
    ]
}

#[test]
fn endpoints_return_endpoint_stops() {
    let stops = scale();
    assert_eq!(color_at(0.0, &stops), stops[0].color);
    assert_eq!(color_at(1.0, &stops), stops[2].color);
}

#[test]
fn exact_stop_offset_returns_stop_color() {
    let stops = scale();
    assert_eq!(color_at(0.5, &stops), stops[1].color);
}

#[test]
fn interpolation_stays_between_bracketing_stops() {
    let stops = scale();
    let mid = color_at(0.25, &stops);
    let (lo, hi) = (stops[0].color, stops[1].color);
    assert!(mid.r <= lo.r.max(hi.r) && mid.r >= lo.r.min(hi.r));
    assert!(mid.g <= lo.g.max(hi.g) && mid.g >= lo.g.min(hi.g));
    assert!(mid.b <= lo.b.max(hi.b) && mid.b >= lo.b.min(hi.b));
}

#[test]
fn midpoint_interpolates_channels() {
    let stops = vec![
        ColorStop::new(0.0, Rgb::new(0, 0, 0)),
        ColorStop::new(1.0, Rgb::new(200, 100, 50)),
    ];
    assert_eq!(color_at(0.5, &stops), Rgb::new(100, 50, 25));
}

#[test]
fn out_of_range_clamps_to_endpoints() {
    let stops = scale();
    assert_eq!(color_at(-0.5, &stops), stops[0].color);
    assert_eq!(color_at(1.5, &stops), stops[2].color);
}

#[test]
fn empty_stop_list_falls_back() {
    assert_eq!(color_at(0.5, &[]), Rgb::default());
}

#[test]
fn hex_round_trip() {
    let color: Rgb = "#d29922".parse().expect("parse hex");
    assert_eq!(color, Rgb::new(0xd2, 0x99, 0x22));
    assert_eq!(color.to_string(), "#d29922");
}

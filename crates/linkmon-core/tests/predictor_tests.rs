use linkmon_core::predictor::{LEVEL_CAUTION, LEVEL_CRITICAL, LEVEL_NONE, LEVEL_WARNING};
use linkmon_core::{LinkPredictor, Thresholds};

fn predictor() -> LinkPredictor {
    LinkPredictor::new(Thresholds::default())
}

#[test]
fn healthy_link_raises_nothing() {
    let mut p = predictor();
    let prediction = p.predict(Some(-40.0), Some(20.0), Some(10.0), Some(4));
    assert_eq!(prediction.level, LEVEL_NONE);
    assert!(prediction.messages.is_empty());
}

#[test]
fn rssi_bands_escalate() {
    let mut p = predictor();
    assert_eq!(
        p.predict(Some(-65.0), None, None, Some(2)).level,
        LEVEL_CAUTION
    );
    assert_eq!(
        p.predict(Some(-80.0), None, None, Some(1)).level,
        LEVEL_WARNING
    );
    let critical = p.predict(Some(-90.0), None, None, Some(0));
    assert_eq!(critical.level, LEVEL_CRITICAL);
    assert!(critical.messages.iter().any(|m| m.contains("-90")));
}

#[test]
fn falling_trend_fires_over_the_window() {
    let mut p = predictor();
    // Slope -7 dBm per sample over a window of five.
    for rssi in [-30.0, -37.0, -44.0, -51.0, -58.0] {
        p.predict(Some(rssi), Some(20.0), Some(10.0), Some(3));
    }
    let prediction = p.predict(Some(-65.0), Some(20.0), Some(10.0), Some(2));
    assert!(prediction.level >= LEVEL_WARNING);
    assert!(prediction
        .messages
        .iter()
        .any(|m| m.contains("dropping fast")));
}

#[test]
fn high_rtt_warns() {
    let mut p = predictor();
    let prediction = p.predict(Some(-40.0), Some(250.0), Some(125.0), Some(4));
    assert_eq!(prediction.level, LEVEL_WARNING);
    assert!(prediction.messages.iter().any(|m| m.contains("Round-trip")));
}

#[test]
fn status_counts_predictions_and_warnings() {
    let mut p = predictor();
    p.predict(Some(-40.0), Some(20.0), Some(10.0), Some(4));
    p.predict(Some(-90.0), Some(20.0), Some(10.0), Some(0));
    let status = p.status();
    assert_eq!(status.mode, "rules");
    assert_eq!(status.total_predictions, 2);
    assert_eq!(status.warnings_given, 1);
}

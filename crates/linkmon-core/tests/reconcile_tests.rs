use linkmon_core::events::{SeriesHistory, WireSample};
use linkmon_core::timeutils::format_rfc3339;
use linkmon_core::{
    ConnectionStatus, Dashboard, LinkEvent, Measurement, MessageSet, Snapshot, StatusChange,
    Warning,
};
use serde_json::json;

fn wire_history(count: usize) -> Vec<WireSample> {
    (0..count)
        .map(|i| WireSample {
            time: format_rfc3339(linkmon_core::now_utc()),
            value: json!(i as f64),
        })
        .collect()
}

fn sample(rssi: Option<f64>, rtt: Option<f64>, count: Option<u64>) -> Measurement {
    Measurement {
        timestamp: format_rfc3339(linkmon_core::now_utc()),
        rssi,
        rtt,
        latency: rtt.map(|v| (v / 2.0).floor()),
        quality: rssi.map(linkmon_core::QualityLevel::from_rssi),
        count,
        packet_loss: None,
        warning: None,
    }
}

#[test]
fn snapshot_repopulates_buffers_to_capacity() {
    let mut dashboard = Dashboard::new(60);
    let snapshot = Snapshot {
        chart_data: SeriesHistory {
            rssi: wire_history(65),
            rtt: wire_history(10),
        },
        ..Snapshot::default()
    };
    dashboard.apply(LinkEvent::Snapshot(Box::new(snapshot)));

    assert_eq!(dashboard.rssi_series().len(), 60);
    let (_, values) = dashboard.rssi_series().to_series();
    // Oldest five dropped, order preserved.
    assert_eq!(values[0], 5.0);
    assert_eq!(*values.last().unwrap(), 64.0);
    assert_eq!(dashboard.rtt_series().len(), 10);
}

#[test]
fn negative_round_trip_is_coerced_positive() {
    let mut dashboard = Dashboard::new(10);
    dashboard.apply(LinkEvent::Sample(sample(Some(-55.0), Some(-42.0), Some(1))));

    assert_eq!(dashboard.latency_gauge().value(), 42.0);
    assert_eq!(dashboard.rtt_series().latest().unwrap().value, 42.0);
    assert_eq!(dashboard.current().rtt, Some(42.0));
}

#[test]
fn samples_update_gauges_and_counters() {
    let mut dashboard = Dashboard::new(10);
    dashboard.apply(LinkEvent::Sample(sample(Some(-60.0), Some(30.0), Some(7))));

    assert_eq!(dashboard.signal_gauge().value(), -60.0);
    assert_eq!(dashboard.signal_bars().level(), 4);
    assert_eq!(dashboard.measurement_count(), 7);
    assert_eq!(dashboard.rssi_series().len(), 1);
}

#[test]
fn disconnect_resets_live_indicators_but_keeps_history() {
    let mut dashboard = Dashboard::new(10);
    for i in 0..4 {
        dashboard.apply(LinkEvent::Sample(sample(Some(-45.0), Some(20.0), Some(i))));
    }
    dashboard.apply(LinkEvent::Status(StatusChange {
        status: ConnectionStatus::Disconnected,
        timestamp: format_rfc3339(linkmon_core::now_utc()),
        disconnect_count: Some(1),
        duration: None,
        warning: None,
    }));

    assert_eq!(dashboard.signal_gauge().value(), -100.0);
    assert_eq!(dashboard.latency_gauge().value(), 0.0);
    assert_eq!(dashboard.signal_bars().level(), 0);
    assert_eq!(dashboard.current().rssi, None);
    assert_eq!(dashboard.connection(), ConnectionStatus::Disconnected);
    assert_eq!(dashboard.disconnect_count(), 1);
    // Chart history survives the reset.
    assert_eq!(dashboard.rssi_series().len(), 4);
}

#[test]
fn nan_sample_values_leave_state_unchanged() {
    let mut dashboard = Dashboard::new(10);
    dashboard.apply(LinkEvent::Sample(sample(Some(-50.0), Some(25.0), Some(1))));
    dashboard.apply(LinkEvent::Sample(sample(Some(f64::NAN), Some(f64::NAN), Some(2))));

    assert_eq!(dashboard.signal_gauge().value(), -50.0);
    assert_eq!(dashboard.latency_gauge().value(), 25.0);
    assert_eq!(dashboard.rssi_series().len(), 1);
    assert_eq!(dashboard.measurement_count(), 2);
}

#[test]
fn warning_feed_is_bounded_and_newest_first() {
    let mut dashboard = Dashboard::new(10);
    for i in 0..55 {
        dashboard.apply(LinkEvent::Warning(Warning {
            timestamp: format_rfc3339(linkmon_core::now_utc()),
            level: 2,
            messages: MessageSet::One(format!("warning {i}")),
            source: None,
        }));
    }

    let warnings: Vec<_> = dashboard.warnings().collect();
    assert_eq!(warnings.len(), 50);
    assert_eq!(warnings[0].messages.joined(), "warning 54");
    assert_eq!(dashboard.warning_counts().caution, 55);
    assert_eq!(dashboard.active_indicator(), Some(2));
}

#[test]
fn embedded_sample_warning_is_forwarded() {
    let mut dashboard = Dashboard::new(10);
    let mut m = sample(Some(-88.0), Some(10.0), Some(1));
    m.warning = Some(Warning {
        timestamp: m.timestamp.clone(),
        level: 4,
        messages: MessageSet::Many(vec!["signal very weak".into()]),
        source: Some("rules".into()),
    });
    dashboard.apply(LinkEvent::Sample(m));

    assert_eq!(dashboard.warnings().count(), 1);
    assert_eq!(dashboard.warning_counts().critical, 1);
}

use linkmon_core::now_utc;
use linkmon_core::stats::{compute_stats, IssueTracker, StatsAccumulator};

#[test]
fn compute_stats_matches_hand_computed_values() {
    let stats = compute_stats(&[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);
    assert_eq!(stats.avg, 2.5);
    assert_eq!(stats.median, 2.5);
    // Population std of 1..4 is sqrt(1.25), rounded to two decimals.
    assert_eq!(stats.std, 1.12);
}

#[test]
fn empty_input_yields_zeroes() {
    let stats = compute_stats(&[]);
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.avg, 0.0);
    assert_eq!(stats.std, 0.0);
}

#[test]
fn odd_length_median_is_the_middle_element() {
    let stats = compute_stats(&[5.0, 1.0, 3.0]);
    assert_eq!(stats.median, 3.0);
}

#[test]
fn accumulator_splits_channels() {
    let mut acc = StatsAccumulator::new();
    acc.record(Some(-50.0), Some(40.0), Some(20.0));
    acc.record(Some(-60.0), None, Some(f64::NAN));
    let set = acc.stats();
    assert_eq!(set.rssi.min, -60.0);
    assert_eq!(set.rtt.max, 40.0);
    // The NaN latency was dropped, only the first reading counts.
    assert_eq!(set.latency.avg, 20.0);
    assert_eq!(acc.observed(), 2);
}

#[test]
fn issue_report_includes_loss_rate_and_downtime() {
    let mut issues = IssueTracker::new();
    issues.record_gap(3);
    let t0 = now_utc();
    issues.record_disconnect(t0);
    issues.record_reconnect(t0 + time::Duration::seconds(4));

    let report = issues.report(97);
    assert_eq!(report.packet_loss, 3);
    assert_eq!(report.packet_loss_rate, 3.0);
    assert_eq!(report.disconnects, 1);
    assert_eq!(report.total_downtime, 4.0);
    assert_eq!(report.avg_disconnect, 4.0);
}

#[test]
fn reconnect_without_disconnect_is_ignored() {
    let mut issues = IssueTracker::new();
    assert!(issues.record_reconnect(now_utc()).is_none());
    assert_eq!(issues.report(10).total_downtime, 0.0);
}

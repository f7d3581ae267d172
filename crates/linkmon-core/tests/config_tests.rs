use linkmon_core::Config;
use std::io::Write;
use std::time::Duration;

#[test]
fn missing_file_yields_expanded_defaults() {
    let cfg = Config::load(Some(std::path::Path::new("/nonexistent/linkmon.toml")))
        .expect("load default config");
    assert_eq!(cfg.viewer.chart_capacity, 60);
    assert_eq!(cfg.feed.interval, Duration::from_secs(1));
    let pid = cfg.feed.pid_file.expect("default pid file");
    assert!(!pid.to_string_lossy().contains('~'), "pid path should be expanded");
}

#[test]
fn partial_toml_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[feed]
listen = "0.0.0.0:9000"
interval = "500ms"
simulate = true

[viewer]
chart_capacity = 120

[thresholds]
rtt_warning = 80.0
"#
    )
    .unwrap();

    let cfg = Config::load(Some(file.path())).expect("load config");
    assert_eq!(cfg.feed.listen, "0.0.0.0:9000");
    assert_eq!(cfg.feed.interval, Duration::from_millis(500));
    assert!(cfg.feed.simulate);
    assert_eq!(cfg.viewer.chart_capacity, 120);
    assert_eq!(cfg.thresholds.rtt_warning, 80.0);
    // Untouched sections keep their defaults.
    assert_eq!(cfg.thresholds.rtt_critical, 200.0);
    assert_eq!(cfg.logging.level, "info");
}

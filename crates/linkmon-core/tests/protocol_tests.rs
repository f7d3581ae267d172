use linkmon_core::protocol::{
    encode_control, encode_data, encode_snapshot, encode_status, encode_warning, parse_control,
    parse_line,
};
use linkmon_core::{
    ConnectionStatus, ControlMessage, FeedMessage, MessageSet, Snapshot, Warning,
};

#[test]
fn data_lines_round_trip() {
    let line = encode_data(-55, 42, 7);
    assert_eq!(line, "DATA:-55,42,7");
    let message = parse_line(&line).unwrap().unwrap();
    assert_eq!(
        message,
        FeedMessage::Data {
            rssi: -55,
            rtt: 42,
            count: 7
        }
    );
}

#[test]
fn status_lines_round_trip() {
    for status in [ConnectionStatus::Connected, ConnectionStatus::Disconnected] {
        let line = encode_status(status);
        let message = parse_line(&line).unwrap().unwrap();
        assert_eq!(message, FeedMessage::Status(status));
    }
}

#[test]
fn blank_lines_are_not_messages() {
    assert!(parse_line("").unwrap().is_none());
    assert!(parse_line("   \n").unwrap().is_none());
}

#[test]
fn malformed_data_is_an_error_not_a_panic() {
    assert!(parse_line("DATA:abc,1,2").is_err());
    assert!(parse_line("DATA:1,2").is_err());
    assert!(parse_line("STATUS:SOMETIMES").is_err());
    assert!(parse_line("NOISE").is_err());
}

#[test]
fn snapshot_json_round_trips() {
    let snapshot = Snapshot {
        session_id: "20260807_120000".into(),
        connection_status: Some(ConnectionStatus::Connected),
        ..Snapshot::default()
    };
    let line = encode_snapshot(&snapshot).unwrap();
    match parse_line(&line).unwrap().unwrap() {
        FeedMessage::Snapshot(parsed) => assert_eq!(*parsed, snapshot),
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[test]
fn warning_messages_accept_string_or_list() {
    let single = Warning {
        timestamp: "2026-08-07T12:00:00Z".into(),
        level: 4,
        messages: MessageSet::One("link lost".into()),
        source: Some("system".into()),
    };
    let line = encode_warning(&single).unwrap();
    assert!(matches!(
        parse_line(&line).unwrap().unwrap(),
        FeedMessage::Warning(w) if w.messages.joined() == "link lost"
    ));

    // A hand-written list payload parses the same way.
    let raw = r#"WARN:{"timestamp":"2026-08-07T12:00:00Z","level":2,"messages":["a","b"]}"#;
    match parse_line(raw).unwrap().unwrap() {
        FeedMessage::Warning(w) => assert_eq!(w.messages.joined(), "a, b"),
        other => panic!("expected warning, got {other:?}"),
    }
}

#[test]
fn stats_control_round_trips() {
    assert_eq!(
        parse_control(encode_control(ControlMessage::RequestStats)),
        Some(ControlMessage::RequestStats)
    );
    assert_eq!(parse_control("DATA:1,2,3"), None);
}

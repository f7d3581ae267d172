use linkmon_core::{now_utc, Sample, TimeSeriesBuffer};
use serde_json::json;

#[test]
fn append_past_capacity_keeps_last_window() {
    let mut buffer = TimeSeriesBuffer::new(5);
    let now = now_utc();
    for i in 0..12 {
        buffer.push(now, f64::from(i));
    }
    assert_eq!(buffer.len(), 5);
    let (_, values) = buffer.to_series();
    assert_eq!(values, vec![7.0, 8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn non_finite_append_is_a_no_op() {
    let mut buffer = TimeSeriesBuffer::new(5);
    let now = now_utc();
    buffer.push(now, 1.0);
    buffer.push(now, f64::NAN);
    buffer.push(now, f64::INFINITY);
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.discarded(), 2);
}

#[test]
fn raw_values_parse_like_the_wire() {
    let mut buffer = TimeSeriesBuffer::new(5);
    let now = now_utc();
    buffer.push_raw(now, &json!(-61));
    buffer.push_raw(now, &json!("14.5"));
    buffer.push_raw(now, &json!("not a number"));
    buffer.push_raw(now, &json!(null));
    let (_, values) = buffer.to_series();
    assert_eq!(values, vec![-61.0, 14.5]);
    assert_eq!(buffer.discarded(), 2);
}

#[test]
fn replace_all_keeps_only_the_tail() {
    let mut buffer = TimeSeriesBuffer::new(60);
    let now = now_utc();
    let samples: Vec<Sample> = (0..65).map(|i| Sample::new(now, f64::from(i))).collect();
    buffer.replace_all(samples);
    assert_eq!(buffer.len(), 60);
    let (_, values) = buffer.to_series();
    assert_eq!(values[0], 5.0);
    assert_eq!(*values.last().unwrap(), 64.0);
}

#[test]
fn replace_all_filters_invalid_before_trimming() {
    let mut buffer = TimeSeriesBuffer::new(3);
    let now = now_utc();
    let samples = vec![
        Sample::new(now, 1.0),
        Sample::new(now, f64::NAN),
        Sample::new(now, 2.0),
        Sample::new(now, 3.0),
        Sample::new(now, 4.0),
    ];
    buffer.replace_all(samples);
    let (_, values) = buffer.to_series();
    assert_eq!(values, vec![2.0, 3.0, 4.0]);
}

#[test]
fn projection_preserves_insertion_order() {
    let mut buffer = TimeSeriesBuffer::new(10);
    let now = now_utc();
    for value in [3.0, 1.0, 2.0] {
        buffer.push(now, value);
    }
    let (labels, values) = buffer.to_series();
    assert_eq!(values, vec![3.0, 1.0, 2.0]);
    assert_eq!(labels.len(), values.len());
}

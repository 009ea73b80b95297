use domain::MetricPoint;
use motor_storage::{InMemoryMeasurementStore, MeasurementStore, encode_line, influx::write_url};

fn sample_point(motor_id: &str, topic: &str, position: f64) -> MetricPoint {
    MetricPoint {
        measurement: "motor_positions".to_string(),
        tags: vec![
            ("motor_id".to_string(), motor_id.to_string()),
            ("topic".to_string(), topic.to_string()),
        ],
        fields: vec![("position".to_string(), position)],
        ts_ms: 1_700_000_000_000,
    }
}

#[tokio::test]
async fn in_memory_records_points() {
    let store = InMemoryMeasurementStore::new();
    store
        .write_point(&sample_point("m1", "motors/arm", 1.5))
        .await
        .expect("write");
    assert_eq!(store.len(), 1);
    assert_eq!(store.attempts(), 1);
    assert_eq!(store.points()[0].field("position"), Some(1.5));
}

#[tokio::test]
async fn in_memory_failure_counts_attempt() {
    let store = InMemoryMeasurementStore::failing();
    let err = store
        .write_point(&sample_point("m1", "motors/arm", 1.5))
        .await
        .expect_err("forced failure");
    assert_eq!(err.to_string(), "forced failure");
    assert_eq!(store.attempts(), 1);
    assert!(store.is_empty());
}

#[test]
fn line_protocol_basic() {
    let line = encode_line(&sample_point("m1", "motors/arm", 12.5)).expect("encode");
    assert_eq!(
        line,
        "motor_positions,motor_id=m1,topic=motors/arm position=12.5 1700000000000"
    );
}

#[test]
fn line_protocol_whole_number_and_negative() {
    let line = encode_line(&sample_point("m1", "t", 5.0)).expect("encode");
    assert_eq!(line, "motor_positions,motor_id=m1,topic=t position=5 1700000000000");
    let line = encode_line(&sample_point("m1", "t", -0.25)).expect("encode");
    assert_eq!(
        line,
        "motor_positions,motor_id=m1,topic=t position=-0.25 1700000000000"
    );
}

#[test]
fn line_protocol_escapes_tags() {
    let line = encode_line(&sample_point("arm 1,a=b", "t", 1.0)).expect("encode");
    assert_eq!(
        line,
        "motor_positions,motor_id=arm\\ 1\\,a\\=b,topic=t position=1 1700000000000"
    );
}

#[test]
fn line_protocol_omits_empty_tag_values() {
    let line = encode_line(&sample_point("", "t", 1.0)).expect("encode");
    assert_eq!(line, "motor_positions,topic=t position=1 1700000000000");
}

#[test]
fn line_protocol_rejects_non_finite() {
    assert!(encode_line(&sample_point("m1", "t", f64::NAN)).is_err());
    assert!(encode_line(&sample_point("m1", "t", f64::INFINITY)).is_err());
}

#[test]
fn write_url_contains_query() {
    let url = write_url("http://influx.local:8086/", "my org", "motors").expect("url");
    assert_eq!(url.path(), "/api/v2/write");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("org".to_string(), "my org".to_string()),
            ("bucket".to_string(), "motors".to_string()),
            ("precision".to_string(), "ms".to_string()),
        ]
    );
}

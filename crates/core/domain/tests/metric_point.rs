use domain::{FIELD_POSITION, MetricPoint, TAG_MOTOR_ID, TAG_TOPIC};

#[test]
fn metric_point_lookups() {
    let point = MetricPoint {
        measurement: "motor_positions".to_string(),
        tags: vec![
            (TAG_MOTOR_ID.to_string(), "m1".to_string()),
            (TAG_TOPIC.to_string(), "motors/arm".to_string()),
        ],
        fields: vec![(FIELD_POSITION.to_string(), 42.0)],
        ts_ms: 1_700_000_000_000,
    };

    assert_eq!(point.tag(TAG_MOTOR_ID), Some("m1"));
    assert_eq!(point.tag(TAG_TOPIC), Some("motors/arm"));
    assert_eq!(point.tag("missing"), None);
    assert_eq!(point.field(FIELD_POSITION), Some(42.0));
}

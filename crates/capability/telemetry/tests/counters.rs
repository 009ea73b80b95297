use motor_telemetry::{TelemetryMetrics, metrics, record_write_latency_ms};

#[test]
fn fresh_metrics_are_zero() {
    let snapshot = TelemetryMetrics::new().snapshot();
    assert_eq!(snapshot.messages_received, 0);
    assert_eq!(snapshot.write_failure, 0);
}

#[test]
fn write_latency_accumulates() {
    let before = metrics().snapshot();
    record_write_latency_ms(7);
    record_write_latency_ms(3);
    let after = metrics().snapshot();
    assert!(after.write_latency_ms_total >= before.write_latency_ms_total + 10);
    assert!(after.write_latency_ms_count >= before.write_latency_ms_count + 2);
}

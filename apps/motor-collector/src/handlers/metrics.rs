//! Telemetry 指标快照。
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use motor_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            messages_received: snapshot.messages_received,
            dropped_malformed: snapshot.dropped_malformed,
            dropped_invalid_kind: snapshot.dropped_invalid_kind,
            dropped_invalid_amount: snapshot.dropped_invalid_amount,
            dropped_unknown_kind: snapshot.dropped_unknown_kind,
            positions_applied: snapshot.positions_applied,
            write_success: snapshot.write_success,
            write_failure: snapshot.write_failure,
            write_latency_ms_total: snapshot.write_latency_ms_total,
            write_latency_ms_count: snapshot.write_latency_ms_count,
            subscribe_failures: snapshot.subscribe_failures,
        })),
    )
        .into_response()
}

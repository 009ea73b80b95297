//! 稳定的 DTO 与 API 响应契约。

use serde::Serialize;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 电机当前位置。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorPositionDto {
    pub motor_id: String,
    pub position: f64,
    pub updated_at_ms: i64,
    pub update_count: u64,
}

/// 计数指标快照。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub messages_received: u64,
    pub dropped_malformed: u64,
    pub dropped_invalid_kind: u64,
    pub dropped_invalid_amount: u64,
    pub dropped_unknown_kind: u64,
    pub positions_applied: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
    pub subscribe_failures: u64,
}

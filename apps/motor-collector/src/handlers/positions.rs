//! 电机位置查询 handlers
//!
//! - GET /positions
//! - GET /positions/{motor_id}

use crate::AppState;
use api_contract::{ApiResponse, MotorPositionDto};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use motor_storage::{MotorPositionRecord, StorageError};

pub async fn list_positions(State(state): State<AppState>) -> Response {
    match state.positions.list_positions().await {
        Ok(records) => {
            let data: Vec<MotorPositionDto> = records.into_iter().map(position_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn get_position(
    State(state): State<AppState>,
    Path(motor_id): Path<String>,
) -> Response {
    match state.positions.get_position(&motor_id).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(position_to_dto(record))),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
        )
            .into_response(),
        Err(err) => storage_error(err),
    }
}

fn position_to_dto(record: MotorPositionRecord) -> MotorPositionDto {
    MotorPositionDto {
        motor_id: record.motor_id,
        position: record.position,
        updated_at_ms: record.updated_at_ms,
        update_count: record.update_count,
    }
}

fn storage_error(err: StorageError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", err.to_string())),
    )
        .into_response()
}

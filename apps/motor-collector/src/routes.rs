//! 路由定义
//!
//! - 健康检查：/health
//! - 电机位置：/positions, /positions/{motor_id}
//! - 计数指标：/metrics

use super::AppState;
use super::handlers::*;
use super::middleware::request_context;
use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

/// 创建状态接口路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/positions", get(list_positions))
        .route("/positions/:motor_id", get(get_position))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}

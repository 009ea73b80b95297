//! 电机位置采集服务：MQTT 报文 → 内存位置表 → InfluxDB 时序指标。

pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod routes;

use motor_ingest::{ShutdownSignal, wait_for_shutdown};
use motor_storage::PositionStore;
use std::sync::Arc;
use tracing::info;

/// 状态接口共享状态（只读访问位置表）。
#[derive(Clone)]
pub struct AppState {
    pub positions: Arc<dyn PositionStore>,
}

/// 绑定地址并在后台启动状态接口，停机信号到达后优雅退出。
pub async fn spawn_http(
    addr: &str,
    state: AppState,
    mut shutdown: ShutdownSignal,
) -> std::io::Result<tokio::task::JoinHandle<std::io::Result<()>>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "http_listening");
    let app = routes::create_router(state);
    Ok(tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { wait_for_shutdown(&mut shutdown).await })
            .await
    }))
}

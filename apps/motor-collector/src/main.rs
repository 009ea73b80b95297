//! 电机位置采集服务入口：加载配置、装配链路、等待退出信号。

use motor_collector::ingest::{PositionHandler, spawn_ingest};
use motor_collector::{AppState, spawn_http};
use motor_config::AppConfig;
use motor_ingest::{MqttSource, MqttSourceConfig};
use motor_pipeline::{MetricEmitter, PositionEngine};
use motor_storage::{InMemoryPositionStore, InfluxConfig, InfluxMeasurementStore, PositionStore};
use motor_telemetry::init_tracing;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 初始化结构化日志（先于配置，保证配置错误可见）
    init_tracing();
    // 从环境变量加载运行配置；缺少任何必填项都不进入服务状态
    let config = AppConfig::from_env().inspect_err(|err| {
        error!(error = %err, "config_invalid");
    })?;

    // 位置表：进程内唯一的共享可变状态
    let positions: Arc<dyn PositionStore> = Arc::new(InMemoryPositionStore::new());
    // InfluxDB 时序 sink
    let sink = Arc::new(InfluxMeasurementStore::new(InfluxConfig {
        url: config.influx_url.clone(),
        token: config.influx_token.clone(),
        org: config.influx_org.clone(),
        bucket: config.influx_bucket.clone(),
        timeout_ms: config.influx_timeout_ms,
    })?);
    info!(
        url = %sink.write_url(),
        measurement = %config.influx_measurement,
        "influx_sink_ready"
    );

    let handler = Arc::new(PositionHandler::new(
        PositionEngine::new(positions.clone()),
        MetricEmitter::with_measurement(sink, config.influx_measurement.clone()),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mqtt_config = MqttSourceConfig {
        host: config.mqtt_broker.host.clone(),
        port: config.mqtt_broker.port,
        client_id: config.mqtt_client_id.clone(),
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        topics: config.mqtt_topics.clone(),
        qos: config.mqtt_qos,
        keep_alive_seconds: config.mqtt_keep_alive_seconds,
        disconnect_timeout_ms: config.mqtt_disconnect_timeout_ms,
    };
    info!(
        host = %mqtt_config.host,
        port = mqtt_config.port,
        topics = ?mqtt_config.topics,
        "ingest source: mqtt"
    );
    let mut ingest = spawn_ingest(
        Arc::new(MqttSource::new(mqtt_config)),
        handler,
        shutdown_rx.clone(),
    );

    let http = if config.http_enabled {
        Some(spawn_http(&config.http_addr, AppState { positions }, shutdown_rx).await?)
    } else {
        None
    };

    // 等待退出信号；采集任务提前结束（如初始连接失败）视为致命错误
    let ingest_result = tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown_signal_received");
            let _ = shutdown_tx.send(true);
            ingest.await
        }
        result = &mut ingest => {
            let _ = shutdown_tx.send(true);
            result
        }
    };

    if let Some(http) = http {
        match http.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "http_server_failed"),
            Err(err) => warn!(error = %err, "http_task_failed"),
        }
    }

    match ingest_result {
        Ok(Ok(())) => {
            info!("shutdown_complete");
            Ok(())
        }
        Ok(Err(err)) => {
            error!(error = %err, "ingest_failed");
            Err(err.into())
        }
        Err(err) => {
            error!(error = %err, "ingest_task_failed");
            Err(err.into())
        }
    }
}

/// 等待 SIGINT / SIGTERM。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

//! 采集链路装配模块
//!
//! 单条消息的处理顺序：报文解析 → 位置更新 → 指标写入。
//! 每个阶段的失败只影响当前消息：记录日志与计数后继续处理后续消息。
//! 位置更新一旦提交，即使指标写入失败也不会回滚。

use domain::InboundMessage;
use motor_ingest::{IngestError, RawMessageHandler, ShutdownSignal, Source};
use motor_normalize::{ParseError, parse_payload};
use motor_pipeline::{EngineError, MetricEmitter, PipelineError, PositionEngine};
use motor_storage::PositionChange;
use motor_telemetry::{
    new_message_id, record_dropped_invalid_amount, record_dropped_invalid_kind,
    record_dropped_malformed, record_dropped_unknown_kind, record_message_received,
    record_position_applied, record_write_failure, record_write_latency_ms, record_write_success,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, warn};

/// 单条消息处理失败的原因。
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("position {position} committed for motor {motor_id:?} but not persisted: {source}")]
    Sink {
        motor_id: String,
        position: f64,
        source: PipelineError,
    },
}

/// 位置采集处理器
///
/// 实现 `RawMessageHandler`，由传输层对每条消息并发调用；自身不保存消息间状态，
/// 共享状态全部位于位置表中。
pub struct PositionHandler {
    /// 位置更新引擎（持有共享位置表）
    engine: PositionEngine,
    /// 指标发射器（持有时序 sink）
    emitter: MetricEmitter,
}

impl PositionHandler {
    pub fn new(engine: PositionEngine, emitter: MetricEmitter) -> Self {
        Self { engine, emitter }
    }

    /// 驱动单条消息走完整条链路。
    pub async fn process(&self, message: &InboundMessage) -> Result<PositionChange, MessageError> {
        // 1. 解析报文
        let update = parse_payload(&message.payload)?;

        // 2. 更新位置表（未知运动类型在此拒绝）
        let ts_ms = now_epoch_ms();
        let change = self.engine.apply(&update, ts_ms).await?;
        record_position_applied();

        // 3. 写入时序指标（位置表锁已释放）
        let point = self
            .emitter
            .point_for(&update.motor_id, &message.topic, change.current, ts_ms);
        let write_started_at = Instant::now();
        match self.emitter.emit(point).await {
            Ok(()) => {
                record_write_success();
                record_write_latency_ms(write_started_at.elapsed().as_millis() as u64);
                Ok(change)
            }
            Err(source) => {
                record_write_failure();
                Err(MessageError::Sink {
                    motor_id: update.motor_id,
                    position: change.current,
                    source,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl RawMessageHandler for PositionHandler {
    async fn handle(&self, message: InboundMessage) -> Result<(), IngestError> {
        record_message_received();
        let span = tracing::info_span!(
            "message",
            message_id = %new_message_id(),
            topic = %message.topic
        );
        async move {
            let payload = String::from_utf8_lossy(&message.payload).into_owned();
            match self.process(&message).await {
                Ok(change) => {
                    info!(
                        target: "motor.ingest",
                        payload = %payload,
                        previous = ?change.previous,
                        position = change.current,
                        "position_written"
                    );
                    Ok(())
                }
                Err(MessageError::Sink {
                    motor_id,
                    position,
                    source,
                }) => {
                    warn!(
                        target: "motor.ingest",
                        motor_id = %motor_id,
                        position = position,
                        error = %source,
                        "sink_write_failed"
                    );
                    Err(IngestError::Handler(source.to_string()))
                }
                Err(err) => {
                    record_rejection(&err);
                    warn!(
                        target: "motor.ingest",
                        payload = %payload,
                        error = %err,
                        "message_rejected"
                    );
                    Ok(())
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn record_rejection(err: &MessageError) {
    match err {
        MessageError::Parse(ParseError::MalformedMessage { .. }) => record_dropped_malformed(),
        MessageError::Parse(ParseError::InvalidMovementKind { .. }) => {
            record_dropped_invalid_kind()
        }
        MessageError::Parse(ParseError::InvalidAmount { .. }) => record_dropped_invalid_amount(),
        MessageError::Engine(EngineError::UnknownMovementKind { .. }) => {
            record_dropped_unknown_kind()
        }
        MessageError::Engine(EngineError::Storage(_)) | MessageError::Sink { .. } => {}
    }
}

/// 获取当前 Unix 时间戳（毫秒）
fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}

/// 启动采集任务
///
/// 采集源在停机信号到达后停止接收消息，等待处理中的消息完成后返回。
/// 初始连接失败会以错误结束任务。
pub fn spawn_ingest(
    source: Arc<dyn Source>,
    handler: Arc<PositionHandler>,
    shutdown: ShutdownSignal,
) -> tokio::task::JoinHandle<Result<(), IngestError>> {
    tokio::spawn(async move {
        let result = source.run(handler, shutdown).await;
        if let Err(err) = &result {
            warn!(target: "motor.ingest", error = %err, "ingest_stopped");
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use motor_storage::{
        InMemoryMeasurementStore, InMemoryPositionStore, PositionStore,
    };

    struct Fixture {
        handler: PositionHandler,
        positions: Arc<InMemoryPositionStore>,
        sink: Arc<InMemoryMeasurementStore>,
    }

    fn fixture() -> Fixture {
        let positions = Arc::new(InMemoryPositionStore::new());
        let sink = Arc::new(InMemoryMeasurementStore::new());
        let handler = PositionHandler::new(
            PositionEngine::new(positions.clone()),
            MetricEmitter::new(sink.clone()),
        );
        Fixture {
            handler,
            positions,
            sink,
        }
    }

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage {
            topic: topic.to_string(),
            payload: payload.as_bytes().to_vec(),
            received_at_ms: 1,
        }
    }

    async fn position(store: &InMemoryPositionStore, motor_id: &str) -> Option<f64> {
        store
            .get_position(motor_id)
            .await
            .expect("get")
            .map(|record| record.position)
    }

    #[tokio::test]
    async fn valid_message_updates_store_and_emits_point() {
        let fx = fixture();
        let change = fx
            .handler
            .process(&message("motors/arm", "m1:1:12.5"))
            .await
            .expect("process");
        assert_eq!(change.current, 12.5);
        assert_eq!(position(&fx.positions, "m1").await, Some(12.5));

        let points = fx.sink.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tag("motor_id"), Some("m1"));
        assert_eq!(points[0].tag("topic"), Some("motors/arm"));
        assert_eq!(points[0].field("position"), Some(12.5));
        assert!(points[0].ts_ms > 0);
    }

    #[tokio::test]
    async fn rejected_messages_do_not_touch_store_or_sink() {
        let fx = fixture();
        fx.handler
            .process(&message("motors/arm", "m1:0:3"))
            .await
            .expect("seed");
        assert_eq!(fx.sink.attempts(), 1);

        for payload in ["m1", "m1:x:5", "m1:1:abc", "m1:9:5"] {
            let err = fx
                .handler
                .process(&message("motors/arm", payload))
                .await
                .expect_err(payload);
            assert!(!matches!(err, MessageError::Sink { .. }), "{payload}");
            assert_eq!(position(&fx.positions, "m1").await, Some(3.0), "{payload}");
        }
        assert_eq!(fx.sink.attempts(), 1);
    }

    #[tokio::test]
    async fn rejection_errors_carry_their_kind() {
        let fx = fixture();
        let err = fx
            .handler
            .process(&message("t", "m1:9:5"))
            .await
            .expect_err("unknown");
        assert!(matches!(
            err,
            MessageError::Engine(EngineError::UnknownMovementKind { code: 9, .. })
        ));
        let err = fx
            .handler
            .process(&message("t", "m1:1:abc"))
            .await
            .expect_err("amount");
        assert!(matches!(
            err,
            MessageError::Parse(ParseError::InvalidAmount { .. })
        ));
    }

    #[tokio::test]
    async fn sink_failure_keeps_committed_position() {
        let fx = fixture();
        fx.sink.set_failing(true);
        let err = fx
            .handler
            .process(&message("motors/arm", "m1:0:7"))
            .await
            .expect_err("sink failure");
        assert!(matches!(
            err,
            MessageError::Sink { position, .. } if position == 7.0
        ));
        assert_eq!(position(&fx.positions, "m1").await, Some(7.0));
        assert_eq!(fx.sink.attempts(), 1);

        fx.sink.set_failing(false);
        fx.handler
            .process(&message("motors/arm", "m1:1:1"))
            .await
            .expect("recovered");
        assert_eq!(position(&fx.positions, "m1").await, Some(8.0));
    }

    #[tokio::test]
    async fn handle_swallows_rejections_and_reports_sink_errors() {
        let fx = fixture();
        fx.handler
            .handle(message("t", "garbage"))
            .await
            .expect("rejections are logged, not propagated");
        fx.sink.set_failing(true);
        let err = fx
            .handler
            .handle(message("t", "m1:2:0"))
            .await
            .expect_err("sink error");
        assert!(matches!(err, IngestError::Handler(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_relative_updates_are_serialized() {
        let fx = fixture();
        let handler = Arc::new(fx.handler);
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..100 {
            let handler = handler.clone();
            let topic = if i % 2 == 0 { "motors/a" } else { "motors/b" };
            tasks.spawn(async move { handler.process(&message(topic, "m1:1:1.0")).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.expect("join").expect("process");
        }
        assert_eq!(position(&fx.positions, "m1").await, Some(100.0));
        assert_eq!(fx.sink.len(), 100);
        let mut emitted: Vec<f64> = fx
            .sink
            .points()
            .iter()
            .filter_map(|point| point.field("position"))
            .collect();
        emitted.sort_by(|a, b| a.total_cmp(b));
        let expected: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(emitted, expected);
    }
}

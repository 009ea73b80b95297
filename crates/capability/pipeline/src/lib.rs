use domain::{FIELD_POSITION, MetricPoint, MotorUpdate, TAG_MOTOR_ID, TAG_TOPIC};
use motor_storage::{MeasurementStore, PositionChange, PositionStore};
use std::sync::Arc;
use tracing::debug;

/// 位置更新错误。
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown movement kind {code} for motor {motor_id:?}")]
    UnknownMovementKind { motor_id: String, code: i64 },
    #[error("position store error: {0}")]
    Storage(String),
}

/// 指标写入错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("sink write error: {0}")]
    Sink(String),
}

/// 位置更新引擎：按运动类型计算新位置并提交到位置表。
#[derive(Clone)]
pub struct PositionEngine {
    store: Arc<dyn PositionStore>,
}

impl PositionEngine {
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PositionStore> {
        &self.store
    }

    /// 应用一次更新并返回新位置。
    ///
    /// 未知运动类型不会触碰位置表。
    pub async fn apply(
        &self,
        update: &MotorUpdate,
        ts_ms: i64,
    ) -> Result<PositionChange, EngineError> {
        let unknown = || EngineError::UnknownMovementKind {
            motor_id: update.motor_id.clone(),
            code: update.kind.code(),
        };
        if !update.kind.is_recognized() {
            return Err(unknown());
        }
        let kind = update.kind;
        let amount = update.amount;
        let change = self
            .store
            .update_position(&update.motor_id, ts_ms, &move |current| {
                kind.apply(current, amount)
            })
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))?;
        let change = change.ok_or_else(unknown)?;
        debug!(
            target: "motor.pipeline",
            motor_id = %update.motor_id,
            kind = kind.as_str(),
            amount = amount,
            previous = ?change.previous,
            position = change.current,
            "position_committed"
        );
        Ok(change)
    }
}

/// 指标发射器：把位置结果写入时序 sink（单次同步写入，无批量、无重试）。
#[derive(Clone)]
pub struct MetricEmitter {
    sink: Arc<dyn MeasurementStore>,
    measurement: String,
}

impl MetricEmitter {
    pub fn new(sink: Arc<dyn MeasurementStore>) -> Self {
        Self::with_measurement(sink, domain::DEFAULT_MEASUREMENT)
    }

    pub fn with_measurement(
        sink: Arc<dyn MeasurementStore>,
        measurement: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            measurement: measurement.into(),
        }
    }

    /// 构造位置指标点：tags = {motor_id, topic}，field = {position}。
    pub fn point_for(
        &self,
        motor_id: &str,
        topic: &str,
        position: f64,
        ts_ms: i64,
    ) -> MetricPoint {
        MetricPoint {
            measurement: self.measurement.clone(),
            tags: vec![
                (TAG_MOTOR_ID.to_string(), motor_id.to_string()),
                (TAG_TOPIC.to_string(), topic.to_string()),
            ],
            fields: vec![(FIELD_POSITION.to_string(), position)],
            ts_ms,
        }
    }

    pub async fn emit(&self, point: MetricPoint) -> Result<(), PipelineError> {
        self.sink
            .write_point(&point)
            .await
            .map_err(|err| PipelineError::Sink(err.to_string()))
    }
}

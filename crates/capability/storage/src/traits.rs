//! 存储接口 Trait 定义
//!
//! - PositionStore：电机位置表（原子读-改-写 + 只读查询）
//! - MeasurementStore：时序指标写入（外部 sink）
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 位置表不暴露内部映射，只能通过接口修改

use crate::error::StorageError;
use crate::models::{MotorPositionRecord, PositionChange};
use async_trait::async_trait;
use domain::MetricPoint;

/// 位置计算函数：输入当前位置，返回新位置；返回 `None` 表示拒绝更新。
pub type PositionUpdateFn<'a> = &'a (dyn Fn(f64) -> Option<f64> + Send + Sync);

/// 电机位置存储接口
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// 对单个电机执行原子读-改-写。
    ///
    /// 未出现过的电机以 0 作为当前值。`update` 返回 `None` 时存储保持不变并返回 `Ok(None)`。
    /// 同一电机的并发调用被串行化，不会基于同一个旧值计算两次。
    async fn update_position(
        &self,
        motor_id: &str,
        ts_ms: i64,
        update: PositionUpdateFn<'_>,
    ) -> Result<Option<PositionChange>, StorageError>;

    /// 查询单个电机的当前位置
    async fn get_position(
        &self,
        motor_id: &str,
    ) -> Result<Option<MotorPositionRecord>, StorageError>;

    /// 列出所有电机的当前位置（按电机 ID 排序）
    async fn list_positions(&self) -> Result<Vec<MotorPositionRecord>, StorageError>;
}

/// 时序指标写入接口
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// 同步写入单个指标点（无批量、无重试）
    async fn write_point(&self, point: &MetricPoint) -> Result<(), StorageError>;
}

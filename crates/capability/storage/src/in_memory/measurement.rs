//! 时序写入内存实现
//!
//! 用于本地测试和不连接 InfluxDB 的演练运行。

use crate::error::StorageError;
use crate::traits::MeasurementStore;
use domain::MetricPoint;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 时序写入内存存储
#[derive(Default)]
pub struct InMemoryMeasurementStore {
    points: RwLock<Vec<MetricPoint>>,
    failing: AtomicBool,
    attempts: AtomicU64,
}

impl InMemoryMeasurementStore {
    /// 创建新的时序写入存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个所有写入都失败的存储（用于测试）
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// 已成功写入的指标点数量
    pub fn len(&self) -> usize {
        self.points.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 写入尝试次数（含失败）
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// 已写入指标点的副本
    pub fn points(&self) -> Vec<MetricPoint> {
        self.points.read().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl MeasurementStore for InMemoryMeasurementStore {
    async fn write_point(&self, point: &MetricPoint) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.failing.load(Ordering::Relaxed) {
            return Err(StorageError::new("forced failure"));
        }
        let mut points = self
            .points
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        points.push(point.clone());
        Ok(())
    }
}

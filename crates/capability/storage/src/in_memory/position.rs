//! 电机位置内存实现
//!
//! 单把互斥锁覆盖整张表；锁只在读-改-写期间持有，不跨越任何 await。

use crate::error::StorageError;
use crate::models::{MotorPositionRecord, PositionChange};
use crate::traits::{PositionStore, PositionUpdateFn};
use std::collections::HashMap;
use std::sync::Mutex;

/// 电机位置内存存储
#[derive(Default)]
pub struct InMemoryPositionStore {
    positions: Mutex<HashMap<String, MotorPositionRecord>>,
}

impl InMemoryPositionStore {
    /// 创建空的位置表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取电机数量（用于测试）
    pub fn len(&self) -> usize {
        self.positions.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn update_position(
        &self,
        motor_id: &str,
        ts_ms: i64,
        update: PositionUpdateFn<'_>,
    ) -> Result<Option<PositionChange>, StorageError> {
        let mut positions = self
            .positions
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        let previous = positions.get(motor_id).map(|record| record.position);
        let Some(current) = update(previous.unwrap_or(0.0)) else {
            return Ok(None);
        };
        let record = positions
            .entry(motor_id.to_string())
            .or_insert_with(|| MotorPositionRecord {
                motor_id: motor_id.to_string(),
                position: 0.0,
                updated_at_ms: ts_ms,
                update_count: 0,
            });
        record.position = current;
        record.updated_at_ms = ts_ms;
        record.update_count = record.update_count.saturating_add(1);
        Ok(Some(PositionChange { previous, current }))
    }

    async fn get_position(
        &self,
        motor_id: &str,
    ) -> Result<Option<MotorPositionRecord>, StorageError> {
        let positions = self
            .positions
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(positions.get(motor_id).cloned())
    }

    async fn list_positions(&self) -> Result<Vec<MotorPositionRecord>, StorageError> {
        let positions = self
            .positions
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<MotorPositionRecord> = positions.values().cloned().collect();
        items.sort_by(|a, b| a.motor_id.cmp(&b.motor_id));
        Ok(items)
    }
}

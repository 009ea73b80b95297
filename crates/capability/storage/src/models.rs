//! 数据模型
//!
//! - 位置模型：MotorPositionRecord, PositionChange

/// 位置表中的一行（每个电机 ID 至多一条）。
#[derive(Debug, Clone, PartialEq)]
pub struct MotorPositionRecord {
    pub motor_id: String,
    pub position: f64,
    pub updated_at_ms: i64,
    pub update_count: u64,
}

/// 一次原子读-改-写的结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionChange {
    /// 更新前的位置；首次出现的电机为 `None`（按 0 计算）。
    pub previous: Option<f64>,
    pub current: f64,
}

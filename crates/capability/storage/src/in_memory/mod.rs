//! 内存存储实现模块
//!
//! 包含以下实现：
//! - PositionStore: InMemoryPositionStore（生产环境即使用该实现，位置不做持久化）
//! - MeasurementStore: InMemoryMeasurementStore（测试与演练）

pub mod measurement;
pub mod position;

pub use measurement::*;
pub use position::*;

//! # Motor Storage 模块
//!
//! 本模块提供采集服务的存储抽象层。
//!
//! ## 组成
//!
//! 1. **接口抽象层** (`traits.rs`)：`PositionStore`（电机位置表）与 `MeasurementStore`（时序 sink）
//! 2. **数据模型层** (`models.rs`)：位置记录与读-改-写结果
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **实现层**：
//!    - `in_memory/`：内存位置表（唯一实现，位置不做持久化）与内存时序存储（测试）
//!    - `influx`：InfluxDB v2 HTTP 写入（生产环境使用）
//!
//! ## 并发约束
//!
//! 位置表的读-改-写在单把锁内完成，锁不跨越 sink 的网络写入；
//! 不同电机的更新不会被慢速 I/O 串行化。

// 模块导出：将子模块的内容导出到 crate 根目录
pub mod error;
pub mod in_memory;
pub mod influx;
pub mod models;
pub mod traits;

pub use error::*;
pub use influx::{InfluxConfig, InfluxMeasurementStore, encode_line};
pub use models::*;
pub use traits::*;

pub use in_memory::{InMemoryMeasurementStore, InMemoryPositionStore};

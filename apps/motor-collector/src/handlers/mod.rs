//! HTTP handlers（只读状态接口）

pub mod health;
pub mod metrics;
pub mod positions;

pub use health::*;
pub use metrics::*;
pub use positions::*;

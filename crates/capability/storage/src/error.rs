//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - 锁失败（内存位置表）
//! - 行协议编码错误
//! - InfluxDB 写入/传输错误

#[derive(Debug)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(format!("influx request timed out: {}", err));
        }
        Self::new(err.to_string())
    }
}

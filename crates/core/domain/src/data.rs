/// 传输层投递的原始消息。
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

/// 运动类型。
///
/// 报文中的整数编码：`0` 绝对、`1` 相对、`2` 复位。
/// 其余整数保留在 `Unknown` 中，由更新引擎拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Absolute,
    Relative,
    Reset,
    Unknown(i64),
}

impl MovementKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Absolute,
            1 => Self::Relative,
            2 => Self::Reset,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Absolute => 0,
            Self::Relative => 1,
            Self::Reset => 2,
            Self::Unknown(code) => *code,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// 根据当前位置计算新位置；无法识别的类型返回 `None`。
    pub fn apply(&self, current: f64, amount: f64) -> Option<f64> {
        match self {
            Self::Absolute => Some(amount),
            Self::Relative => Some(current + amount),
            Self::Reset => Some(0.0),
            Self::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Relative => "relative",
            Self::Reset => "reset",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// 解析后的电机更新指令（每条有效报文一个）。
#[derive(Debug, Clone, PartialEq)]
pub struct MotorUpdate {
    pub motor_id: String,
    pub kind: MovementKind,
    pub amount: f64,
}

/// 写入时序库的单个指标点。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, f64)>,
    pub ts_ms: i64,
}

impl MetricPoint {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| *value)
    }
}

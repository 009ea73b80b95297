//! 电机运动报文解析。
//!
//! 报文格式：`<motor_id>:<movement_kind_int>:<amount_float>`，整体去除首尾空白后按 `:` 切分。

use domain::{MotorUpdate, MovementKind};

/// 字段分隔符。
pub const FIELD_DELIMITER: char = ':';

/// 报文解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed message: expected 3 fields, got {fields} in {payload:?}")]
    MalformedMessage { payload: String, fields: usize },
    #[error("invalid movement kind {value:?}: {reason}")]
    InvalidMovementKind { value: String, reason: String },
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },
}

/// 解析单条报文。
///
/// 运动类型只校验为整数，未知编码保留为 [`MovementKind::Unknown`]，交由更新引擎拒绝。
pub fn parse_message(payload: &str) -> Result<MotorUpdate, ParseError> {
    let trimmed = payload.trim();
    let parts: Vec<&str> = trimmed.split(FIELD_DELIMITER).collect();
    let [motor_id, kind, amount] = parts.as_slice() else {
        return Err(ParseError::MalformedMessage {
            payload: payload.to_string(),
            fields: parts.len(),
        });
    };

    let code = kind
        .parse::<i64>()
        .map_err(|err| ParseError::InvalidMovementKind {
            value: kind.to_string(),
            reason: err.to_string(),
        })?;
    let amount_value = amount
        .parse::<f64>()
        .map_err(|err| ParseError::InvalidAmount {
            value: amount.to_string(),
            reason: err.to_string(),
        })?;

    Ok(MotorUpdate {
        motor_id: motor_id.to_string(),
        kind: MovementKind::from_code(code),
        amount: amount_value,
    })
}

/// 解析原始字节报文（非 UTF-8 字节按替换字符处理）。
pub fn parse_payload(payload: &[u8]) -> Result<MotorUpdate, ParseError> {
    parse_message(&String::from_utf8_lossy(payload))
}

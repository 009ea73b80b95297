pub mod data;

pub use data::{InboundMessage, MetricPoint, MotorUpdate, MovementKind};

/// 默认的时序 measurement 名称。
pub const DEFAULT_MEASUREMENT: &str = "motor_positions";

/// 指标点中电机 ID 的 tag 名。
pub const TAG_MOTOR_ID: &str = "motor_id";

/// 指标点中来源主题的 tag 名。
pub const TAG_TOPIC: &str = "topic";

/// 指标点中位置值的 field 名。
pub const FIELD_POSITION: &str = "position";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_kind_codes() {
        assert_eq!(MovementKind::from_code(0), MovementKind::Absolute);
        assert_eq!(MovementKind::from_code(1), MovementKind::Relative);
        assert_eq!(MovementKind::from_code(2), MovementKind::Reset);
        assert_eq!(MovementKind::from_code(9), MovementKind::Unknown(9));
        assert_eq!(MovementKind::from_code(-1).code(), -1);
    }

    #[test]
    fn movement_kind_apply() {
        assert_eq!(MovementKind::Absolute.apply(3.0, 5.0), Some(5.0));
        assert_eq!(MovementKind::Relative.apply(3.0, 5.0), Some(8.0));
        assert_eq!(MovementKind::Reset.apply(3.0, 5.0), Some(0.0));
        assert_eq!(MovementKind::Unknown(7).apply(3.0, 5.0), None);
    }
}

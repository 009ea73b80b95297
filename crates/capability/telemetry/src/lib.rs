//! 追踪初始化、消息/请求 ID 生成与进程级计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub dropped_malformed: u64,
    pub dropped_invalid_kind: u64,
    pub dropped_invalid_amount: u64,
    pub dropped_unknown_kind: u64,
    pub positions_applied: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
    pub subscribe_failures: u64,
}

/// 进程级计数指标。
pub struct TelemetryMetrics {
    messages_received: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_invalid_kind: AtomicU64,
    dropped_invalid_amount: AtomicU64,
    dropped_unknown_kind: AtomicU64,
    positions_applied: AtomicU64,
    write_success: AtomicU64,
    write_failure: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
    subscribe_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            dropped_malformed: AtomicU64::new(0),
            dropped_invalid_kind: AtomicU64::new(0),
            dropped_invalid_amount: AtomicU64::new(0),
            dropped_unknown_kind: AtomicU64::new(0),
            positions_applied: AtomicU64::new(0),
            write_success: AtomicU64::new(0),
            write_failure: AtomicU64::new(0),
            write_latency_ms_total: AtomicU64::new(0),
            write_latency_ms_count: AtomicU64::new(0),
            subscribe_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_invalid_kind: self.dropped_invalid_kind.load(Ordering::Relaxed),
            dropped_invalid_amount: self.dropped_invalid_amount.load(Ordering::Relaxed),
            dropped_unknown_kind: self.dropped_unknown_kind.load(Ordering::Relaxed),
            positions_applied: self.positions_applied.load(Ordering::Relaxed),
            write_success: self.write_success.load(Ordering::Relaxed),
            write_failure: self.write_failure.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
            subscribe_failures: self.subscribe_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 生成单条入站消息的追踪 ID。
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录入站消息次数。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录字段数错误的报文。
pub fn record_dropped_malformed() {
    metrics().dropped_malformed.fetch_add(1, Ordering::Relaxed);
}

/// 记录运动类型非整数的报文。
pub fn record_dropped_invalid_kind() {
    metrics()
        .dropped_invalid_kind
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录数值非法的报文。
pub fn record_dropped_invalid_amount() {
    metrics()
        .dropped_invalid_amount
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录未知运动类型的报文。
pub fn record_dropped_unknown_kind() {
    metrics()
        .dropped_unknown_kind
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录位置更新成功次数。
pub fn record_position_applied() {
    metrics().positions_applied.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入成功次数。
pub fn record_write_success() {
    metrics().write_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入失败次数。
pub fn record_write_failure() {
    metrics().write_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入延迟（毫秒）。
pub fn record_write_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .write_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .write_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录主题订阅失败次数。
pub fn record_subscribe_failure() {
    metrics()
        .subscribe_failures
        .fetch_add(1, Ordering::Relaxed);
}

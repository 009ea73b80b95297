use async_trait::async_trait;
use domain::InboundMessage;
use motor_telemetry::record_subscribe_failure;
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("connect error: {0}")]
    Connect(String),
    #[error("subscribe error on {topic}: {reason}")]
    Subscribe { topic: String, reason: String },
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// 停机信号：值变为 `true` 或发送端被丢弃时停止接收消息。
pub type ShutdownSignal = watch::Receiver<bool>;

/// 入站消息处理器（可能被多个任务并发调用）。
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(
        &self,
        handler: Arc<dyn RawMessageHandler>,
        shutdown: ShutdownSignal,
    ) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试），直到停机信号到达才返回。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(
        &self,
        _handler: Arc<dyn RawMessageHandler>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), IngestError> {
        wait_for_shutdown(&mut shutdown).await;
        Ok(())
    }
}

/// 等待停机信号。
pub async fn wait_for_shutdown(shutdown: &mut ShutdownSignal) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// 消息分发器：每条消息在独立任务中处理，并跟踪仍在处理中的任务。
pub struct Dispatcher {
    handler: Arc<dyn RawMessageHandler>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn RawMessageHandler>) -> Self {
        Self {
            handler,
            tasks: JoinSet::new(),
        }
    }

    /// 派发一条消息；处理失败只记录日志，不影响后续消息。
    pub fn dispatch(&mut self, message: InboundMessage) {
        let handler = self.handler.clone();
        self.tasks.spawn(async move {
            let topic = message.topic.clone();
            // 处理器已记录带上下文的告警，这里只保留调试信息
            if let Err(err) = handler.handle(message).await {
                debug!(target: "motor.ingest", topic = %topic, error = %err, "message_handler_failed");
            }
        });
    }

    /// 回收已完成的任务。
    pub fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(err) = result {
                warn!(target: "motor.ingest", error = %err, "message_task_aborted");
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// 等待所有处理中的消息完成。
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result {
                warn!(target: "motor.ingest", error = %err, "message_task_aborted");
            }
        }
    }
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topics: Vec<String>,
    pub qos: u8,
    pub keep_alive_seconds: u64,
    pub disconnect_timeout_ms: u64,
}

/// MQTT 采集源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_seconds.max(5)));
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        options
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(
        &self,
        handler: Arc<dyn RawMessageHandler>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), IngestError> {
        // 请求通道需容纳一次性发出的全部 SUBSCRIBE
        let capacity = self.config.topics.len() + 10;
        let (client, mut eventloop) = AsyncClient::new(self.options(), capacity);
        let qos = qos_from_u8(self.config.qos);
        let mut dispatcher = Dispatcher::new(handler);
        let mut pending_subscriptions: VecDeque<String> = VecDeque::new();
        let mut connected = false;

        loop {
            dispatcher.reap();
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            connected = true;
                            info!(
                                target: "motor.ingest",
                                host = %self.config.host,
                                port = self.config.port,
                                "mqtt_connected"
                            );
                            // clean session：每次(重)连接后重新订阅
                            pending_subscriptions.clear();
                            for topic in &self.config.topics {
                                match client.try_subscribe(topic.clone(), qos) {
                                    Ok(()) => pending_subscriptions.push_back(topic.clone()),
                                    Err(err) => report_subscribe_failure(&IngestError::Subscribe {
                                        topic: topic.clone(),
                                        reason: err.to_string(),
                                    }),
                                }
                            }
                        }
                        Ok(Event::Incoming(Packet::SubAck(ack))) => {
                            let topic = pending_subscriptions.pop_front().unwrap_or_default();
                            let accepted = ack.return_codes.iter().all(suback_accepted);
                            if accepted {
                                info!(target: "motor.ingest", topic = %topic, "mqtt_subscribed");
                            } else {
                                report_subscribe_failure(&IngestError::Subscribe {
                                    topic,
                                    reason: format!("broker refused: {:?}", ack.return_codes),
                                });
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            dispatcher.dispatch(InboundMessage {
                                topic: publish.topic.clone(),
                                payload: publish.payload.to_vec(),
                                received_at_ms: now_epoch_ms(),
                            });
                        }
                        Ok(_) => {}
                        Err(err) => {
                            if !connected {
                                return Err(IngestError::Connect(err.to_string()));
                            }
                            warn!(target: "motor.ingest", error = %err, "mqtt_eventloop_error");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }

        info!(
            target: "motor.ingest",
            in_flight = dispatcher.in_flight(),
            "mqtt_source_stopping"
        );
        disconnect(
            &client,
            &mut eventloop,
            Duration::from_millis(self.config.disconnect_timeout_ms),
        )
        .await;
        dispatcher.drain().await;
        info!(target: "motor.ingest", "mqtt_source_stopped");
        Ok(())
    }
}

/// 发送 DISCONNECT，并在限定时间内驱动事件循环把它发出去。
async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop, timeout: Duration) {
    if let Err(err) = client.try_disconnect() {
        warn!(target: "motor.ingest", error = %err, "mqtt_disconnect_failed");
        return;
    }
    let flushed = tokio::time::timeout(timeout, async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;
    if flushed.is_err() {
        warn!(
            target: "motor.ingest",
            timeout_ms = timeout.as_millis() as u64,
            "mqtt_disconnect_timeout"
        );
    }
}

fn report_subscribe_failure(err: &IngestError) {
    record_subscribe_failure();
    warn!(target: "motor.ingest", error = %err, "mqtt_subscribe_failed");
}

/// SUBACK 返回码是否表示订阅成功。
pub fn suback_accepted(code: &SubscribeReasonCode) -> bool {
    matches!(code, SubscribeReasonCode::Success(_))
}

pub fn qos_from_u8(value: u8) -> QoS {
    match value {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}

fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suback_codes() {
        assert!(suback_accepted(&SubscribeReasonCode::Success(QoS::AtMostOnce)));
        assert!(!suback_accepted(&SubscribeReasonCode::Failure));
    }

    #[test]
    fn qos_mapping() {
        assert_eq!(qos_from_u8(0), QoS::AtMostOnce);
        assert_eq!(qos_from_u8(1), QoS::AtLeastOnce);
        assert_eq!(qos_from_u8(2), QoS::ExactlyOnce);
    }
}

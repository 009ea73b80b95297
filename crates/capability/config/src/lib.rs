//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// MQTT broker 地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddr {
    pub host: String,
    pub port: u16,
}

impl BrokerAddr {
    /// 解析 broker 地址，支持 `tcp://host:port`、`mqtt://host:port`、`host:port`、`host`。
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let rest = ["tcp://", "mqtt://"]
            .iter()
            .find_map(|scheme| value.strip_prefix(scheme))
            .unwrap_or(value);
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() || rest.contains("://") {
            return None;
        }
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().ok()?),
            None => (rest, DEFAULT_MQTT_PORT),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port,
        })
    }
}

const DEFAULT_MQTT_PORT: u16 = 1883;

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mqtt_broker: BrokerAddr,
    pub mqtt_topics: Vec<String>,
    pub mqtt_client_id: String,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_qos: u8,
    pub mqtt_keep_alive_seconds: u64,
    pub mqtt_disconnect_timeout_ms: u64,
    pub influx_url: String,
    pub influx_token: String,
    pub influx_org: String,
    pub influx_bucket: String,
    pub influx_measurement: String,
    pub influx_timeout_ms: u64,
    pub http_enabled: bool,
    pub http_addr: String,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let broker = read_required("MQTT_BROKER")?;
        let mqtt_broker = BrokerAddr::parse(&broker)
            .ok_or_else(|| ConfigError::Invalid("MQTT_BROKER".to_string(), broker.clone()))?;
        let mqtt_topics = read_topics()?;
        let influx_url = read_required("INFLUX_URL")?;
        let influx_token = read_required("INFLUX_TOKEN")?;
        let influx_org = read_required("INFLUX_ORG")?;
        let influx_bucket = read_required("INFLUX_BUCKET")?;

        let mqtt_client_id = read_optional("MQTT_CLIENT_ID")
            .unwrap_or_else(|| "motor-collector".to_string());
        let mqtt_username = read_optional("MQTT_USERNAME");
        let mqtt_password = read_optional("MQTT_PASSWORD");
        let mqtt_qos = read_u8_with_default("MQTT_QOS", 0)?;
        if mqtt_qos > 2 {
            return Err(ConfigError::Invalid(
                "MQTT_QOS".to_string(),
                mqtt_qos.to_string(),
            ));
        }
        let mqtt_keep_alive_seconds = read_u64_with_default("MQTT_KEEP_ALIVE_SECONDS", 30)?;
        let mqtt_disconnect_timeout_ms =
            read_u64_with_default("MQTT_DISCONNECT_TIMEOUT_MS", 250)?;
        let influx_measurement = read_optional("INFLUX_MEASUREMENT")
            .unwrap_or_else(|| domain::DEFAULT_MEASUREMENT.to_string());
        let influx_timeout_ms = read_u64_with_default("INFLUX_TIMEOUT_MS", 5000)?;
        let http_enabled = read_bool_with_default("HTTP_ENABLED", true);
        let http_addr = env::var("HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        Ok(Self {
            mqtt_broker,
            mqtt_topics,
            mqtt_client_id,
            mqtt_username,
            mqtt_password,
            mqtt_qos,
            mqtt_keep_alive_seconds,
            mqtt_disconnect_timeout_ms,
            influx_url,
            influx_token,
            influx_org,
            influx_bucket,
            influx_measurement,
            influx_timeout_ms,
            http_enabled,
            http_addr,
        })
    }
}

/// 读取订阅主题：优先 `MQTT_TOPICS`（逗号分隔），否则依次读取 `MQTT_TOPIC1`、`MQTT_TOPIC2` ...
fn read_topics() -> Result<Vec<String>, ConfigError> {
    let topics = match read_optional("MQTT_TOPICS") {
        Some(value) => split_topics(&value),
        None => {
            let mut topics = Vec::new();
            let mut index = 1;
            while let Some(value) = read_optional(&format!("MQTT_TOPIC{}", index)) {
                topics.push(value.trim().to_string());
                index += 1;
            }
            topics.retain(|topic| !topic.is_empty());
            topics
        }
    };
    if topics.is_empty() {
        return Err(ConfigError::Missing("MQTT_TOPICS".to_string()));
    }
    Ok(topics)
}

/// 拆分逗号分隔的主题列表，去除空白和重复项。
pub fn split_topics(value: &str) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for topic in value.split(',').map(str::trim) {
        if topic.is_empty() || topics.iter().any(|existing| existing == topic) {
            continue;
        }
        topics.push(topic.to_string());
    }
    topics
}

fn read_required(key: &str) -> Result<String, ConfigError> {
    read_optional(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_addr_accepts_common_forms() {
        let expected = BrokerAddr {
            host: "broker.local".to_string(),
            port: 1884,
        };
        assert_eq!(BrokerAddr::parse("tcp://broker.local:1884"), Some(expected.clone()));
        assert_eq!(BrokerAddr::parse("mqtt://broker.local:1884/"), Some(expected.clone()));
        assert_eq!(BrokerAddr::parse("broker.local:1884"), Some(expected));
        assert_eq!(
            BrokerAddr::parse("broker.local"),
            Some(BrokerAddr {
                host: "broker.local".to_string(),
                port: 1883,
            })
        );
    }

    #[test]
    fn broker_addr_rejects_garbage() {
        assert_eq!(BrokerAddr::parse(""), None);
        assert_eq!(BrokerAddr::parse("tcp://"), None);
        assert_eq!(BrokerAddr::parse("broker:notaport"), None);
        assert_eq!(BrokerAddr::parse(":1883"), None);
        assert_eq!(BrokerAddr::parse("ws://broker:80"), None);
    }

    #[test]
    fn split_topics_trims_and_dedups() {
        assert_eq!(
            split_topics(" motors/a, motors/b ,,motors/a"),
            vec!["motors/a".to_string(), "motors/b".to_string()]
        );
    }
}

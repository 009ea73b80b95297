//! InfluxDB v2 时序写入实现
//!
//! 每个指标点编码为一行行协议，通过 `POST /api/v2/write` 同步写入（毫秒精度）。

use crate::error::StorageError;
use crate::traits::MeasurementStore;
use domain::MetricPoint;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

/// InfluxDB 写入配置。
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub timeout_ms: u64,
}

/// InfluxDB 时序存储
pub struct InfluxMeasurementStore {
    client: reqwest::Client,
    write_url: Url,
    auth_header: String,
}

impl InfluxMeasurementStore {
    pub fn new(config: InfluxConfig) -> Result<Self, StorageError> {
        let write_url = write_url(&config.url, &config.org, &config.bucket)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            write_url,
            auth_header: format!("Token {}", config.token),
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

/// 构造写入地址：`{base}/api/v2/write?org=..&bucket=..&precision=ms`
pub fn write_url(base: &str, org: &str, bucket: &str) -> Result<Url, StorageError> {
    let endpoint = format!("{}/api/v2/write", base.trim().trim_end_matches('/'));
    let url = Url::parse_with_params(
        &endpoint,
        &[("org", org), ("bucket", bucket), ("precision", "ms")],
    )
    .map_err(|err| StorageError::new(format!("invalid influx url {:?}: {}", base, err)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(StorageError::new(format!(
            "invalid influx url {:?}: unsupported scheme",
            base
        )));
    }
    Ok(url)
}

#[async_trait::async_trait]
impl MeasurementStore for InfluxMeasurementStore {
    async fn write_point(&self, point: &MetricPoint) -> Result<(), StorageError> {
        let line = encode_line(point)?;
        debug!(target: "motor.sink", line = %line, "influx_write");
        let response = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::new(format!(
            "influx write rejected: {} {}",
            status,
            body.trim()
        )))
    }
}

/// 将指标点编码为一行 InfluxDB 行协议。
///
/// - tag 按 key 排序，值为空的 tag 被省略（行协议不允许空 tag 值）
/// - field 必须为有限浮点数
/// - 时间戳为 Unix 毫秒
pub fn encode_line(point: &MetricPoint) -> Result<String, StorageError> {
    if point.measurement.is_empty() {
        return Err(StorageError::new("measurement name required"));
    }
    if point.fields.is_empty() {
        return Err(StorageError::new("at least one field required"));
    }

    let mut line = escape(&point.measurement, &[',', ' ']);

    let mut tags: Vec<&(String, String)> = point
        .tags
        .iter()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect();
    tags.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in tags {
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    let mut fields = Vec::with_capacity(point.fields.len());
    for (key, value) in &point.fields {
        if key.is_empty() {
            return Err(StorageError::new("field name required"));
        }
        if !value.is_finite() {
            return Err(StorageError::new(format!(
                "field {} is not finite: {}",
                key, value
            )));
        }
        fields.push(format!("{}={}", escape(key, &[',', '=', ' ']), value));
    }
    line.push(' ');
    line.push_str(&fields.join(","));
    line.push(' ');
    line.push_str(&point.ts_ms.to_string());
    Ok(line)
}

fn escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\\' => escaped.push_str("\\\\"),
            ch if special.contains(&ch) => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ch => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_special_characters() {
        assert_eq!(escape("a b,c=d", &[',', '=', ' ']), "a\\ b\\,c\\=d");
        assert_eq!(escape("a=b", &[',', ' ']), "a=b");
    }

    #[test]
    fn write_url_rejects_non_http_scheme() {
        assert!(write_url("ftp://influx.local", "org", "bucket").is_err());
        assert!(write_url("not a url", "org", "bucket").is_err());
    }
}

// Prometheus HTTP API repository implementation
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::report::ReportPeriod;
use crate::domain::sample::{SampleSeries, SensorMeta, SensorType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

type Labels = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct PrometheusRepository {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum QueryData {
    Vector(Vec<VectorSample>),
    Matrix(Vec<MatrixSeries>),
    Scalar(serde_json::Value),
    String(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: Labels,
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MatrixSeries {
    #[serde(default)]
    metric: Labels,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl PrometheusRepository {
    pub fn new(host: String, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();

        if query.is_empty() {
            format!("{}{}", self.host, path)
        } else {
            format!("{}{}?{}", self.host, path, query.join("&"))
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path, params);
        tracing::debug!("Prometheus request: {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to Prometheus")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Prometheus response")?;

        // Query errors come back as 4xx/5xx with a JSON error body
        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(e).context("Failed to parse Prometheus response");
            }
            Err(_) => anyhow::bail!("Prometheus request failed with status {}: {}", status, body),
        };

        if parsed.status != "success" {
            anyhow::bail!(
                "Prometheus query error ({}): {}",
                parsed.error_type.unwrap_or_else(|| "unknown".to_string()),
                parsed.error.unwrap_or_default()
            );
        }

        parsed.data.context("Prometheus response has no data")
    }
}

fn sensor_from_labels(labels: &Labels) -> SensorMeta {
    let id = ["sensor_id", "sensor", "instance"]
        .iter()
        .find_map(|key| labels.get(*key))
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());

    SensorMeta::new(
        id,
        labels.get("sensor_name").cloned(),
        labels
            .get("sensor_type")
            .map(|t| SensorType::parse(t))
            .unwrap_or_else(|| SensorType::Other(String::new())),
        labels.get("model").cloned(),
    )
}

/// `[unix_seconds, "value"]`; either half may come back malformed
fn parse_sample(pair: &[serde_json::Value]) -> (Option<i64>, Option<f64>) {
    let timestamp = pair
        .first()
        .and_then(|t| t.as_f64())
        .map(|seconds| (seconds * 1000.0).round() as i64);

    let value = pair.get(1).and_then(|v| match v {
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        other => other.as_f64(),
    });

    (timestamp, value)
}

fn to_series(labels: &Labels, pairs: &[Vec<serde_json::Value>]) -> SampleSeries {
    let (timestamps, values): (Vec<Option<i64>>, Vec<Option<f64>>) =
        pairs.iter().map(|pair| parse_sample(pair)).unzip();

    let series = SampleSeries::from_parallel(sensor_from_labels(labels), &timestamps, &values);
    let dropped = pairs.len() - series.points.len();
    if dropped > 0 {
        tracing::warn!("Dropped {} malformed samples for sensor {}", dropped, series.sensor.id);
    }
    series
}

fn into_series(data: QueryData) -> Vec<SampleSeries> {
    match data {
        QueryData::Vector(samples) => samples
            .iter()
            .map(|s| to_series(&s.metric, std::slice::from_ref(&s.value)))
            .collect(),
        QueryData::Matrix(series) => series
            .iter()
            .map(|s| to_series(&s.metric, &s.values))
            .collect(),
        QueryData::Scalar(value) | QueryData::String(value) => {
            tracing::warn!("Ignoring non-series query result: {}", value);
            Vec::new()
        }
    }
}

fn unix_seconds(time: DateTime<Utc>) -> String {
    let millis = time.timestamp_millis();
    format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
}

#[async_trait]
impl TelemetryRepository for PrometheusRepository {
    async fn label_values(&self, label: &str) -> Result<Vec<String>> {
        let path = format!("/api/v1/label/{}/values", urlencoding::encode(label));
        self.execute(&path, &[]).await
    }

    async fn series(&self, matcher: &str, period: &ReportPeriod) -> Result<Vec<SensorMeta>> {
        let labels: Vec<Labels> = self
            .execute(
                "/api/v1/series",
                &[
                    ("match[]", matcher.to_string()),
                    ("start", unix_seconds(period.start)),
                    ("end", unix_seconds(period.end)),
                ],
            )
            .await?;

        Ok(labels.iter().map(sensor_from_labels).collect())
    }

    async fn query_instant(&self, query: &str, at: DateTime<Utc>) -> Result<Vec<SampleSeries>> {
        let data: QueryData = self
            .execute(
                "/api/v1/query",
                &[("query", query.to_string()), ("time", unix_seconds(at))],
            )
            .await?;

        Ok(into_series(data))
    }

    async fn query_range(
        &self,
        query: &str,
        period: &ReportPeriod,
        step_seconds: i64,
    ) -> Result<Vec<SampleSeries>> {
        let data: QueryData = self
            .execute(
                "/api/v1/query_range",
                &[
                    ("query", query.to_string()),
                    ("start", unix_seconds(period.start)),
                    ("end", unix_seconds(period.end)),
                    ("step", format!("{}s", step_seconds.max(1))),
                ],
            )
            .await?;

        let series = into_series(data);
        tracing::debug!("Range query returned {} series", series.len());
        Ok(series)
    }
}

// Repository trait for time-series backend access
use crate::domain::report::ReportPeriod;
use crate::domain::sample::{SampleSeries, SensorMeta};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// All values of a label (e.g. every `sensor_type`)
    async fn label_values(&self, label: &str) -> anyhow::Result<Vec<String>>;

    /// Series matching a selector that had data within the period
    async fn series(&self, matcher: &str, period: &ReportPeriod) -> anyhow::Result<Vec<SensorMeta>>;

    /// Evaluate an expression at a single instant; each series holds at most one point
    async fn query_instant(
        &self,
        query: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Vec<SampleSeries>>;

    /// Evaluate an expression over the period at `step_seconds` resolution
    async fn query_range(
        &self,
        query: &str,
        period: &ReportPeriod,
        step_seconds: i64,
    ) -> anyhow::Result<Vec<SampleSeries>>;
}

// Sensor service - Use case for discovering deployed sensors
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::report::ReportPeriod;
use crate::domain::sample::SensorMeta;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct SensorService {
    repository: Arc<dyn TelemetryRepository>,
    matcher: String,
}

impl SensorService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, matcher: String) -> Self {
        Self { repository, matcher }
    }

    /// Sensors with data in the period, one entry per id, sorted by name
    pub async fn list_sensors(&self, period: &ReportPeriod) -> anyhow::Result<Vec<SensorMeta>> {
        let found = self.repository.series(&self.matcher, period).await?;

        let mut seen = HashSet::new();
        let mut sensors: Vec<SensorMeta> = found
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
        sensors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!("Discovered {} sensors", sensors.len());
        Ok(sensors)
    }

    pub async fn list_sensor_types(&self) -> anyhow::Result<Vec<String>> {
        let mut types = self.repository.label_values("sensor_type").await?;
        types.sort();
        types.dedup();
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{SampleSeries, SensorType};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    struct FakeRepository;

    fn sensor(id: &str, name: &str) -> SensorMeta {
        SensorMeta::new(id.to_string(), Some(name.to_string()), SensorType::Environmental, None)
    }

    #[async_trait]
    impl TelemetryRepository for FakeRepository {
        async fn label_values(&self, _label: &str) -> anyhow::Result<Vec<String>> {
            Ok(vec!["temperature".into(), "current".into(), "temperature".into()])
        }

        async fn series(
            &self,
            matcher: &str,
            _period: &ReportPeriod,
        ) -> anyhow::Result<Vec<SensorMeta>> {
            assert_eq!(matcher, "{sensor_id!=\"\"}");
            // One sensor reports several metrics, so it shows up once per metric
            Ok(vec![
                sensor("e2", "Library"),
                sensor("e1", "Atrium"),
                sensor("e2", "Library"),
                sensor("e3", "Atrium"),
            ])
        }

        async fn query_instant(
            &self,
            _query: &str,
            _at: DateTime<Utc>,
        ) -> anyhow::Result<Vec<SampleSeries>> {
            Ok(Vec::new())
        }

        async fn query_range(
            &self,
            _query: &str,
            _period: &ReportPeriod,
            _step_seconds: i64,
        ) -> anyhow::Result<Vec<SampleSeries>> {
            Ok(Vec::new())
        }
    }

    fn service() -> SensorService {
        SensorService::new(Arc::new(FakeRepository), "{sensor_id!=\"\"}".to_string())
    }

    #[tokio::test]
    async fn test_list_sensors_dedupes_and_sorts() {
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let period = ReportPeriod::last_hours(end, 24).unwrap();

        let sensors = service().list_sensors(&period).await.unwrap();
        let ids: Vec<&str> = sensors.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3", "e2"]);
    }

    #[tokio::test]
    async fn test_list_sensor_types_sorted_unique() {
        let types = service().list_sensor_types().await.unwrap();
        assert_eq!(types, vec!["current".to_string(), "temperature".to_string()]);
    }
}

// Sensor sample domain models
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Environmental,
    Current,
    #[serde(untagged)]
    Other(String),
}

impl SensorType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "temperature" => SensorType::Temperature,
            "environmental" => SensorType::Environmental,
            "current" => SensorType::Current,
            other => SensorType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SensorMeta {
    pub id: String,
    pub name: String,
    pub sensor_type: SensorType,
    pub model: Option<String>,
}

impl SensorMeta {
    pub fn new(
        id: String,
        name: Option<String>,
        sensor_type: SensorType,
        model: Option<String>,
    ) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| Self::format_name(&id));
        Self {
            id,
            name,
            sensor_type,
            model,
        }
    }

    fn format_name(id: &str) -> String {
        // Convert "sensor_t1_" to "sensor t1"
        id.trim_end_matches('_').replace('_', " ")
    }
}

/// One sensor's observations over a report period, ordered by time.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    pub sensor: SensorMeta,
    pub points: Vec<TimeSeriesPoint>,
}

impl SampleSeries {
    /// Keeps only finite values; callers get a series they can reduce without re-validating.
    pub fn new(sensor: SensorMeta, points: Vec<TimeSeriesPoint>) -> Self {
        let mut points: Vec<TimeSeriesPoint> =
            points.into_iter().filter(|p| p.value.is_finite()).collect();
        points.sort_by_key(|p| p.time_ms);
        Self { sensor, points }
    }

    /// Build a series from the backend's parallel `timestamps`/`values` arrays.
    ///
    /// Pairs missing either half are dropped. Arrays of unequal length are
    /// zipped up to the shorter one.
    pub fn from_parallel(
        sensor: SensorMeta,
        timestamps: &[Option<i64>],
        values: &[Option<f64>],
    ) -> Self {
        if timestamps.len() != values.len() {
            tracing::warn!(
                "Series {} has {} timestamps but {} values, truncating",
                sensor.id,
                timestamps.len(),
                values.len()
            );
        }

        let points = timestamps
            .iter()
            .zip(values)
            .filter_map(|(t, v)| match (t, v) {
                (Some(t), Some(v)) => Some(TimeSeriesPoint::new(*t, *v)),
                _ => None,
            })
            .collect();

        Self::new(sensor, points)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// Bucketed trend datasets for line charts
use super::record::ReportRecord;
use super::sample::SampleSeries;
use chrono::DateTime;
use serde::Serialize;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Upper bound on buckets per chart; larger requests get wider buckets
const MAX_BUCKETS: i64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TrendWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self {
            start_ms: start_ms.min(end_ms),
            end_ms: start_ms.max(end_ms),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Hourly for a day, 6h up to a week, daily up to two months, weekly beyond.
    pub fn default_bucket_ms(&self) -> i64 {
        let duration = self.duration_ms();
        if duration <= DAY_MS {
            HOUR_MS
        } else if duration <= 7 * DAY_MS {
            6 * HOUR_MS
        } else if duration <= 62 * DAY_MS {
            DAY_MS
        } else {
            7 * DAY_MS
        }
    }

    /// Positive bucket size no wider than the window, with at most
    /// `MAX_BUCKETS` buckets.
    fn effective_bucket_ms(&self, bucket_ms: i64) -> i64 {
        let duration = self.duration_ms().max(1);
        let bucket_ms = if bucket_ms > 0 {
            bucket_ms
        } else {
            self.default_bucket_ms()
        };
        let floor = (duration as u64).div_ceil(MAX_BUCKETS as u64) as i64;
        bucket_ms.min(duration).max(floor).max(1)
    }

    fn bucket_count(&self, bucket_ms: i64) -> usize {
        let count = (self.duration_ms().max(0) as u64).div_ceil(bucket_ms.max(1) as u64);
        count.max(1) as usize
    }

    /// Bucket index for a timestamp; the window end belongs to the last bucket.
    fn bucket_index(&self, time_ms: i64, bucket_ms: i64, buckets: usize) -> Option<usize> {
        if time_ms < self.start_ms || time_ms > self.end_ms {
            return None;
        }
        let index = (time_ms.saturating_sub(self.start_ms) / bucket_ms) as usize;
        Some(index.min(buckets - 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub name: String,
    /// One entry per label; `None` for buckets without samples
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortBand {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDataset {
    pub labels: Vec<String>,
    pub series: Vec<TrendSeries>,
    pub comfort_band: Option<ComfortBand>,
    pub overall_average: Option<f64>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn labels(window: &TrendWindow, bucket_ms: i64, buckets: usize) -> Vec<String> {
    let format = if bucket_ms >= DAY_MS {
        "%d/%m"
    } else if window.duration_ms() > DAY_MS {
        "%d/%m %H:%M"
    } else {
        "%H:%M"
    };

    (0..buckets)
        .map(|i| {
            let start = window.start_ms.saturating_add(bucket_ms.saturating_mul(i as i64));
            DateTime::from_timestamp_millis(start)
                .map(|t| t.format(format).to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Distribute the finite values of `series` into the window's buckets.
fn bucket_values<'a, I>(
    series: I,
    window: &TrendWindow,
    bucket_ms: i64,
    buckets: usize,
) -> Vec<Vec<f64>>
where
    I: IntoIterator<Item = &'a SampleSeries>,
{
    let mut bucketed = vec![Vec::new(); buckets];
    for s in series {
        for point in &s.points {
            if !point.value.is_finite() {
                continue;
            }
            if let Some(index) = window.bucket_index(point.time_ms, bucket_ms, buckets) {
                bucketed[index].push(point.value);
            }
        }
    }
    bucketed
}

fn overall_average(bucketed: &[Vec<f64>]) -> Option<f64> {
    let count: usize = bucketed.iter().map(|b| b.len()).sum();
    if count == 0 {
        return None;
    }
    let sum: f64 = bucketed.iter().flatten().sum();
    Some(round1(sum / count as f64))
}

/// Max/avg/min across all sensors per bucket, plus the comfort band and the
/// period average for overlay lines.
///
/// A `bucket_ms` of zero or less picks [`TrendWindow::default_bucket_ms`].
pub fn build_trend_dataset(
    series: &[SampleSeries],
    window: &TrendWindow,
    bucket_ms: i64,
    comfort_band: Option<ComfortBand>,
) -> TrendDataset {
    let bucket_ms = window.effective_bucket_ms(bucket_ms);
    let buckets = window.bucket_count(bucket_ms);
    let bucketed = bucket_values(series, window, bucket_ms, buckets);

    let mut max = Vec::with_capacity(buckets);
    let mut avg = Vec::with_capacity(buckets);
    let mut min = Vec::with_capacity(buckets);
    for values in &bucketed {
        if values.is_empty() {
            max.push(None);
            avg.push(None);
            min.push(None);
            continue;
        }
        let sum: f64 = values.iter().sum();
        max.push(values.iter().copied().reduce(f64::max).map(round1));
        avg.push(Some(round1(sum / values.len() as f64)));
        min.push(values.iter().copied().reduce(f64::min).map(round1));
    }

    let empty = bucketed.iter().filter(|b| b.is_empty()).count();
    if empty > 0 {
        tracing::debug!("Trend has {} of {} buckets without samples", empty, buckets);
    }

    TrendDataset {
        labels: labels(window, bucket_ms, buckets),
        series: vec![
            TrendSeries {
                name: "Max".to_string(),
                values: max,
            },
            TrendSeries {
                name: "Average".to_string(),
                values: avg,
            },
            TrendSeries {
                name: "Min".to_string(),
                values: min,
            },
        ],
        comfort_band,
        overall_average: overall_average(&bucketed),
    }
}

/// One averaged line per input series, e.g. the phases of a current clamp.
pub fn build_series_trend(
    series: &[SampleSeries],
    window: &TrendWindow,
    bucket_ms: i64,
) -> TrendDataset {
    let bucket_ms = window.effective_bucket_ms(bucket_ms);
    let buckets = window.bucket_count(bucket_ms);

    let lines = series
        .iter()
        .map(|s| {
            let bucketed = bucket_values(std::iter::once(s), window, bucket_ms, buckets);
            TrendSeries {
                name: s.sensor.name.clone(),
                values: bucketed
                    .iter()
                    .map(|values| {
                        if values.is_empty() {
                            None
                        } else {
                            Some(round1(values.iter().sum::<f64>() / values.len() as f64))
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    TrendDataset {
        labels: labels(window, bucket_ms, buckets),
        series: lines,
        comfort_band: None,
        overall_average: overall_average(&bucket_values(series, window, bucket_ms, buckets)),
    }
}

/// JSON that can sit inside a `<script>` element: `<` is written as `\u003c`
/// so sensor names cannot close the element.
fn script_safe_json<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    serde_json::to_string(value)
        .ok()
        .map(|json| json.replace('<', "\\u003c"))
}

impl TrendDataset {
    pub fn to_record(&self, prefix: &str) -> ReportRecord {
        let mut record = ReportRecord::new();
        record.markup(
            format!("{}_dataset", prefix),
            script_safe_json(self).unwrap_or_else(|| "null".to_string()),
        );
        record.markup(
            format!("{}_labels", prefix),
            script_safe_json(&self.labels).unwrap_or_else(|| "[]".to_string()),
        );
        record.integer(format!("{}_bucket_count", prefix), self.labels.len() as i64);
        match self.overall_average {
            Some(average) => record.number(format!("{}_overall_average", prefix), average, 1),
            None => record.text(format!("{}_overall_average", prefix), "-"),
        }
        if let Some(band) = self.comfort_band {
            record.number(format!("{}_comfort_lower", prefix), band.lower, 1);
            record.number(format!("{}_comfort_upper", prefix), band.upper, 1);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::TimeSeriesPoint;
    use crate::domain::test_support::{meta, series_at};

    const BAND: ComfortBand = ComfortBand {
        lower: 20.0,
        upper: 26.0,
    };

    #[test]
    fn test_default_bucket_sizes() {
        assert_eq!(TrendWindow::new(0, DAY_MS).default_bucket_ms(), HOUR_MS);
        assert_eq!(TrendWindow::new(0, 7 * DAY_MS).default_bucket_ms(), 6 * HOUR_MS);
        assert_eq!(TrendWindow::new(0, 30 * DAY_MS).default_bucket_ms(), DAY_MS);
        assert_eq!(TrendWindow::new(0, 90 * DAY_MS).default_bucket_ms(), 7 * DAY_MS);
    }

    #[test]
    fn test_day_window_has_hourly_buckets_with_null_gaps() {
        let window = TrendWindow::new(0, DAY_MS);
        let series = vec![
            series_at("t1", &[(0, 20.0), (HOUR_MS / 2, 22.0), (5 * HOUR_MS, 30.0)]),
            series_at("t2", &[(10 * 60 * 1000, 18.0)]),
        ];

        let dataset = build_trend_dataset(&series, &window, 0, Some(BAND));

        assert_eq!(dataset.labels.len(), 24);
        assert_eq!(dataset.labels[0], "00:00");
        assert_eq!(dataset.labels[5], "05:00");
        for line in &dataset.series {
            assert_eq!(line.values.len(), dataset.labels.len());
        }

        let (max, avg, min) = (&dataset.series[0], &dataset.series[1], &dataset.series[2]);
        assert_eq!(max.values[0], Some(22.0));
        assert_eq!(avg.values[0], Some(20.0));
        assert_eq!(min.values[0], Some(18.0));
        assert_eq!(avg.values[1], None);
        assert_eq!(avg.values[5], Some(30.0));

        assert_eq!(dataset.overall_average, Some(22.5));
        assert_eq!(dataset.comfort_band, Some(BAND));
    }

    #[test]
    fn test_samples_outside_window_ignored_and_end_inclusive() {
        let window = TrendWindow::new(DAY_MS, 2 * DAY_MS);
        let series = vec![series_at("t1", &[(0, 50.0), (2 * DAY_MS, 21.0), (3 * DAY_MS, 50.0)])];

        let dataset = build_trend_dataset(&series, &window, HOUR_MS, None);
        assert_eq!(dataset.series[1].values[23], Some(21.0));
        assert_eq!(dataset.overall_average, Some(21.0));
    }

    #[test]
    fn test_empty_input_keeps_alignment() {
        let window = TrendWindow::new(0, 7 * DAY_MS);
        let dataset = build_trend_dataset(&[], &window, 0, Some(BAND));

        assert_eq!(dataset.labels.len(), 28);
        assert!(dataset.series.iter().all(|s| s.values.len() == 28));
        assert!(dataset.series.iter().all(|s| s.values.iter().all(|v| v.is_none())));
        assert_eq!(dataset.overall_average, None);
    }

    #[test]
    fn test_tiny_bucket_is_widened() {
        let window = TrendWindow::new(0, 30 * DAY_MS);
        let dataset = build_trend_dataset(&[], &window, 1, None);
        assert!(dataset.labels.len() <= MAX_BUCKETS as usize);
    }

    #[test]
    fn test_oversized_bucket_is_one_bucket() {
        let window = TrendWindow::new(0, DAY_MS);
        let series = vec![series_at("t1", &[(0, 20.0), (DAY_MS, 24.0)])];

        let dataset = build_trend_dataset(&series, &window, i64::MAX, None);
        assert_eq!(dataset.labels.len(), 1);
        assert_eq!(dataset.series[1].values, vec![Some(22.0)]);

        let lines = build_series_trend(&series, &window, i64::MAX);
        assert_eq!(lines.series[0].values, vec![Some(22.0)]);
    }

    #[test]
    fn test_extreme_window_does_not_overflow() {
        let window = TrendWindow::new(i64::MIN, i64::MAX);
        let dataset = build_trend_dataset(&[], &window, HOUR_MS, None);
        assert!(dataset.labels.len() <= MAX_BUCKETS as usize);
    }

    #[test]
    fn test_series_trend_one_line_per_phase() {
        let window = TrendWindow::new(0, 2 * HOUR_MS);
        let phase_1 = SampleSeries::new(
            crate::domain::sample::SensorMeta::new(
                "c1_1".to_string(),
                Some("Phase 1".to_string()),
                crate::domain::sample::SensorType::Current,
                None,
            ),
            vec![TimeSeriesPoint::new(0, 4.0), TimeSeriesPoint::new(60_000, 6.0)],
        );
        let phase_2 = SampleSeries::new(meta("c1_2"), vec![TimeSeriesPoint::new(HOUR_MS + 1, 3.0)]);

        let dataset = build_series_trend(&[phase_1, phase_2], &window, HOUR_MS);

        assert_eq!(dataset.labels.len(), 2);
        assert_eq!(dataset.series[0].name, "Phase 1");
        assert_eq!(dataset.series[0].values, vec![Some(5.0), None]);
        assert_eq!(dataset.series[1].values, vec![None, Some(3.0)]);
        assert_eq!(dataset.overall_average, Some(4.3));
    }

    #[test]
    fn test_dataset_json_cannot_close_script_element() {
        let window = TrendWindow::new(0, HOUR_MS);
        let sensor = crate::domain::sample::SensorMeta::new(
            "c1".to_string(),
            Some("</script><script>alert(1)</script>".to_string()),
            crate::domain::sample::SensorType::Current,
            None,
        );
        let series = vec![SampleSeries::new(sensor, vec![TimeSeriesPoint::new(0, 2.0)])];
        let record = build_series_trend(&series, &window, HOUR_MS).to_record("power");

        let json = record.get("power_dataset").map(|v| v.render()).unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("\\u003c/script>"));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["series"][0]["name"], "</script><script>alert(1)</script>");
    }

    #[test]
    fn test_dataset_json_keeps_nulls() {
        let window = TrendWindow::new(0, 2 * HOUR_MS);
        let series = vec![series_at("t1", &[(0, 21.0)])];
        let record = build_trend_dataset(&series, &window, HOUR_MS, Some(BAND)).to_record("trend");

        let json = record.get("trend_dataset").map(|v| v.render()).unwrap();
        assert!(json.contains("\"values\":[21.0,null]"));
        assert_eq!(
            record.get("trend_comfort_upper").map(|v| v.render()),
            Some("26.0".to_string())
        );
    }
}

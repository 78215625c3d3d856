// Report service - Use case for building rendered report documents
use crate::application::telemetry_repository::TelemetryRepository;
use crate::application::template_store::{TemplateStore, TemplateStoreError};
use crate::domain::comfort::compute_comfort_metrics;
use crate::domain::peak::summarize_peaks;
use crate::domain::ranking::{compute_noise_rankings, compute_rankings, SensorAggregate};
use crate::domain::record::ReportRecord;
use crate::domain::report::{ReportKind, ReportPeriod, ReportRequest};
use crate::domain::sample::{SampleSeries, SensorMeta};
use crate::domain::template::TemplateRenderer;
use crate::domain::trend::{build_series_trend, build_trend_dataset, ComfortBand, DAY_MS};
use crate::infrastructure::config::{prepare_query, ReportsConfig};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

const PHASE_SLOTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("time-series backend query failed: {0:#}")]
    Backend(anyhow::Error),
    #[error(transparent)]
    Template(#[from] TemplateStoreError),
}

#[derive(Clone)]
pub struct ReportService {
    repository: Arc<dyn TelemetryRepository>,
    templates: Arc<dyn TemplateStore>,
    renderer: TemplateRenderer,
    config: ReportsConfig,
}

impl ReportService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        templates: Arc<dyn TemplateStore>,
        renderer: TemplateRenderer,
        config: ReportsConfig,
    ) -> Self {
        Self {
            repository,
            templates,
            renderer,
            config,
        }
    }

    /// Fetch, aggregate, and render one report as SVG/HTML text.
    pub async fn build(
        &self,
        kind: ReportKind,
        request: &ReportRequest,
    ) -> Result<String, ReportError> {
        let template = self.templates.load_template(kind.template_name()).await?;

        let mut record = self.base_record(kind, request);
        let data = match kind {
            ReportKind::Comfort => self.comfort_record(request).await,
            ReportKind::Hotspots => self.hotspots_record(&request.period).await,
            ReportKind::Trend => self.trend_record(&request.period).await,
            ReportKind::Noise => self.noise_record(&request.period).await,
            ReportKind::Power => self.power_record(&request.period).await,
        }
        .map_err(ReportError::Backend)?;
        record.extend(data);

        tracing::debug!(
            "Rendering {} report with {} values, locale {}",
            kind.template_name(),
            record.len(),
            request.locale.code()
        );
        Ok(self.renderer.render(&template, &record, request.locale))
    }

    fn base_record(&self, kind: ReportKind, request: &ReportRequest) -> ReportRecord {
        let mut record = request.period.to_record();
        record.text("title", kind.title());
        record.text("locale", request.locale.code());
        record.text("generated_at", Utc::now().format("%d/%m/%Y %H:%M").to_string());

        for (key, label) in [
            ("label_comfort", "Comfort"),
            ("label_cold", "Cold"),
            ("label_hot", "Hot"),
            ("label_critical", "Critical"),
            ("label_avg", "Avg"),
            ("label_max", "Max"),
            ("label_min", "Min"),
        ] {
            record.text(key, label);
        }
        record
    }

    fn step_seconds(&self, period: &ReportPeriod) -> i64 {
        self.config.range.step_for(period.duration_seconds())
    }

    async fn fetch_range(
        &self,
        query: &str,
        period: &ReportPeriod,
    ) -> anyhow::Result<Vec<SampleSeries>> {
        self.repository
            .query_range(query, period, self.step_seconds(period))
            .await
    }

    async fn comfort_record(&self, request: &ReportRequest) -> anyhow::Result<ReportRecord> {
        let series = self
            .fetch_range(&self.config.queries.temperature, &request.period)
            .await?;

        let thresholds = self.config.comfort.thresholds();
        let layout = self.config.layout.chart_layout(request.layout);
        let metrics = compute_comfort_metrics(&series, &thresholds, &layout);

        let mut record = metrics.to_record();
        record.integer("active_sensors", active_sensors(&series));
        Ok(record)
    }

    /// Per-sensor avg/min/max from instant `*_over_time` queries, fetched
    /// concurrently and joined on sensor id.
    async fn hotspots_record(&self, period: &ReportPeriod) -> anyhow::Result<ReportRecord> {
        let mut vars = HashMap::new();
        vars.insert("range".to_string(), format!("{}s", period.duration_seconds()));

        let queries = &self.config.queries;
        let avg_query = prepare_query(&queries.temperature_avg, &vars);
        let min_query = prepare_query(&queries.temperature_min, &vars);
        let max_query = prepare_query(&queries.temperature_max, &vars);

        let (avg, min, max) = futures::try_join!(
            self.repository.query_instant(&avg_query, period.end),
            self.repository.query_instant(&min_query, period.end),
            self.repository.query_instant(&max_query, period.end),
        )?;

        let aggregates = join_instant_aggregates(&avg, &min, &max);
        let rankings = compute_rankings(&aggregates, self.config.ranking.top_n);

        let mut record = rankings.to_record(self.config.ranking.slots);
        record.integer("active_sensors", aggregates.len() as i64);
        Ok(record)
    }

    async fn trend_record(&self, period: &ReportPeriod) -> anyhow::Result<ReportRecord> {
        let series = self
            .fetch_range(&self.config.queries.temperature, period)
            .await?;

        let window = period.window();
        let bucket_ms = window.default_bucket_ms();
        let comfort = &self.config.comfort;
        let band = ComfortBand {
            lower: comfort.cold_below,
            upper: comfort.hot_above,
        };
        let dataset = build_trend_dataset(&series, &window, bucket_ms, Some(band));

        let mut record = dataset.to_record("trend");
        record.text("trend_resolution", resolution_label(bucket_ms));
        record.integer("active_sensors", active_sensors(&series));
        Ok(record)
    }

    async fn noise_record(&self, period: &ReportPeriod) -> anyhow::Result<ReportRecord> {
        let queries = &self.config.queries;
        let (avg_series, peak_series) = futures::try_join!(
            self.fetch_range(&queries.noise_avg, period),
            self.fetch_range(&queries.noise_peak, period),
        )?;

        let aggregates = SensorAggregate::from_all(&avg_series);
        let rankings = compute_noise_rankings(&aggregates, self.config.ranking.top_n);

        let peaks: Vec<f64> = peak_series.iter().flat_map(|s| s.values()).collect();
        let summary = summarize_peaks(&peaks, &self.config.noise.peak_policy());

        let mut record = rankings.to_record(self.config.ranking.slots);
        record.extend(summary.to_record("noise_peak"));
        record.number("noise_peak_percentile_rank", self.config.noise.peak_percentile, 0);
        record.integer("active_sensors", active_sensors(&avg_series));
        Ok(record)
    }

    async fn power_record(&self, period: &ReportPeriod) -> anyhow::Result<ReportRecord> {
        let mut series = self.fetch_range(&self.config.queries.current, period).await?;
        series.sort_by(|a, b| a.sensor.name.cmp(&b.sensor.name));

        let window = period.window();
        let bucket_ms = window.default_bucket_ms();
        let dataset = build_series_trend(&series, &window, bucket_ms);

        let mut record = dataset.to_record("power");
        record.text("power_resolution", resolution_label(bucket_ms));

        let aggregates = SensorAggregate::from_all(&series);
        let mut total_avg = 0.0;
        for (i, aggregate) in aggregates.iter().enumerate() {
            let key = |field: &str| format!("phase_{}_{}", i + 1, field);
            record.text(key("name"), aggregate.sensor.name.clone());
            record.number(key("avg"), aggregate.avg, 2);
            record.number(key("max"), aggregate.max, 2);
            total_avg += aggregate.avg;
        }
        // Clamp boards carry up to four channels
        for i in aggregates.len()..PHASE_SLOTS {
            for field in ["name", "avg", "max"] {
                record.text(format!("phase_{}_{}", i + 1, field), "-");
            }
        }
        record.integer("phase_count", aggregates.len() as i64);
        record.number("power_total_avg", total_avg, 2);
        Ok(record)
    }
}

fn active_sensors(series: &[SampleSeries]) -> i64 {
    series.iter().filter(|s| !s.is_empty()).count() as i64
}

fn resolution_label(bucket_ms: i64) -> &'static str {
    if bucket_ms >= DAY_MS { "Daily" } else { "Hourly" }
}

fn instant_values(series: &[SampleSeries]) -> HashMap<&str, (&SensorMeta, f64)> {
    series
        .iter()
        .filter_map(|s| s.points.first().map(|p| (s.sensor.id.as_str(), (&s.sensor, p.value))))
        .collect()
}

/// Sensors without an average are dropped; a missing min or max falls back
/// to the average so one failed sub-query does not hide the sensor.
fn join_instant_aggregates(
    avg: &[SampleSeries],
    min: &[SampleSeries],
    max: &[SampleSeries],
) -> Vec<SensorAggregate> {
    let min = instant_values(min);
    let max = instant_values(max);

    let mut aggregates: Vec<SensorAggregate> = instant_values(avg)
        .into_iter()
        .map(|(id, (sensor, avg))| SensorAggregate {
            sensor: sensor.clone(),
            avg,
            min: min.get(id).map(|(_, v)| *v).unwrap_or(avg),
            max: max.get(id).map(|(_, v)| *v).unwrap_or(avg),
        })
        .collect();

    // HashMap iteration order is arbitrary; ranking ties rely on input order
    aggregates.sort_by(|a, b| a.sensor.id.cmp(&b.sensor.id));
    aggregates
}

use crate::domain::comfort::{ChartLayout, ComfortThresholds, StatusScale, StatusStyle, StatusTier};
use crate::domain::localization::{Locale, TranslationTable};
use crate::domain::peak::PeakPolicy;
use crate::domain::report::Layout;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub prometheus: PrometheusSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrometheusSettings {
    pub host: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub templates_dir: String,
    /// Selector used for sensor discovery
    pub sensor_matcher: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            templates_dir: "templates".to_string(),
            sensor_matcher: "{sensor_id!=\"\"}".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReportsConfig {
    pub queries: QueriesConfig,
    pub comfort: ComfortConfig,
    pub layout: LayoutConfig,
    pub ranking: RankingConfig,
    pub noise: NoiseConfig,
    pub range: RangeConfig,
}

/// PromQL expressions; `${range}` expands to the report period in seconds
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueriesConfig {
    pub temperature: String,
    pub temperature_avg: String,
    pub temperature_min: String,
    pub temperature_max: String,
    pub noise_avg: String,
    pub noise_peak: String,
    pub current: String,
}

impl Default for QueriesConfig {
    fn default() -> Self {
        Self {
            temperature: "temperature_celsius".to_string(),
            temperature_avg: "avg_over_time(temperature_celsius[${range}])".to_string(),
            temperature_min: "min_over_time(temperature_celsius[${range}])".to_string(),
            temperature_max: "max_over_time(temperature_celsius[${range}])".to_string(),
            noise_avg: "noise_avg_db".to_string(),
            noise_peak: "noise_peak_db".to_string(),
            current: "current_amperes".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusTierConfig {
    pub above: f64,
    pub color: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusStyleConfig {
    pub color: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ComfortConfig {
    pub cold_below: f64,
    pub hot_above: f64,
    pub critical_below: f64,
    pub critical_above: f64,
    /// Empty keeps the built-in three-tier scale
    pub status_tiers: Vec<StatusTierConfig>,
    pub status_fallback: Option<StatusStyleConfig>,
}

impl Default for ComfortConfig {
    fn default() -> Self {
        let defaults = ComfortThresholds::default();
        Self {
            cold_below: defaults.cold_below,
            hot_above: defaults.hot_above,
            critical_below: defaults.critical_below,
            critical_above: defaults.critical_above,
            status_tiers: Vec::new(),
            status_fallback: None,
        }
    }
}

impl ComfortConfig {
    pub fn thresholds(&self) -> ComfortThresholds {
        let status = match (&self.status_tiers[..], &self.status_fallback) {
            ([], _) | (_, None) => StatusScale::default(),
            (tiers, Some(fallback)) => StatusScale::new(
                tiers
                    .iter()
                    .map(|t| StatusTier {
                        above: t.above,
                        style: StatusStyle::new(t.color.clone(), t.text.clone()),
                    })
                    .collect(),
                StatusStyle::new(fallback.color.clone(), fallback.text.clone()),
            ),
        };

        ComfortThresholds {
            cold_below: self.cold_below,
            hot_above: self.hot_above,
            critical_below: self.critical_below,
            critical_above: self.critical_above,
            status,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub circumference: f64,
    pub portrait_bar_width: f64,
    pub landscape_bar_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            circumference: crate::domain::comfort::DEFAULT_CIRCUMFERENCE,
            portrait_bar_width: 340.0,
            landscape_bar_width: 520.0,
        }
    }
}

impl LayoutConfig {
    pub fn chart_layout(&self, layout: Layout) -> ChartLayout {
        let bar_max_width = match layout {
            Layout::Portrait => self.portrait_bar_width,
            Layout::Landscape => self.landscape_bar_width,
        };
        ChartLayout {
            circumference: self.circumference,
            bar_max_width,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub top_n: usize,
    /// Fixed number of rows the templates lay out
    pub slots: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_n: 3, slots: 3 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NoiseConfig {
    pub peak_percentile: f64,
    pub sensor_ceiling_db: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let policy = PeakPolicy::default();
        Self {
            peak_percentile: policy.percentile,
            sensor_ceiling_db: policy.sensor_ceiling,
        }
    }
}

impl NoiseConfig {
    pub fn peak_policy(&self) -> PeakPolicy {
        PeakPolicy {
            percentile: self.peak_percentile,
            sensor_ceiling: self.sensor_ceiling_db,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RangeConfig {
    /// Preferred resolution of range queries
    pub step_seconds: i64,
    /// Backend cap on points per series
    pub max_points: i64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            step_seconds: 300,
            max_points: 11_000,
        }
    }
}

impl RangeConfig {
    pub fn step_for(&self, duration_seconds: i64) -> i64 {
        let max_points = self.max_points.max(1);
        let floor = (duration_seconds + max_points - 1) / max_points;
        self.step_seconds.max(floor).max(1)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranslationsConfig {
    #[serde(default)]
    pub entries: Vec<TranslationEntryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationEntryConfig {
    pub locale: String,
    pub source: String,
    pub target: String,
}

impl TranslationsConfig {
    /// Built-in table with configured entries layered on top
    pub fn table(&self) -> TranslationTable {
        let mut table = TranslationTable::clone(&TranslationTable::builtin());
        for entry in &self.entries {
            let locale = Locale::parse(&entry.locale);
            if locale == Locale::En {
                tracing::warn!(
                    "Ignoring translation of '{}' for default locale '{}'",
                    entry.source,
                    entry.locale
                );
                continue;
            }
            table.insert(&entry.source, locale, &entry.target);
        }
        table
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app"))
        .add_source(config::Environment::with_prefix("REPORTS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_reports_config() -> anyhow::Result<ReportsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/reports"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_translations_config() -> anyhow::Result<TranslationsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/translations").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_query() {
        let mut vars = HashMap::new();
        vars.insert("range".to_string(), "86400s".to_string());

        let query = "avg_over_time(temperature_celsius{sensor_type=\"temperature\"}[${range}])";
        let result = prepare_query(query, &vars);

        assert_eq!(
            result,
            "avg_over_time(temperature_celsius{sensor_type=\"temperature\"}[86400s])"
        );
    }

    #[test]
    fn test_step_respects_point_cap() {
        let range = RangeConfig::default();
        assert_eq!(range.step_for(86_400), 300);
        // A year at 300s would be ~105k points
        assert_eq!(range.step_for(365 * 86_400), 2_867);
    }

    #[test]
    fn test_layout_widths() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.chart_layout(Layout::Portrait).bar_max_width, 340.0);
        assert_eq!(layout.chart_layout(Layout::Landscape).bar_max_width, 520.0);
        assert_eq!(layout.chart_layout(Layout::Landscape).circumference, 198.0);
    }

    #[test]
    fn test_custom_status_tiers() {
        let comfort = ComfortConfig {
            status_tiers: vec![StatusTierConfig {
                above: 90.0,
                color: "green".to_string(),
                text: "Excellent".to_string(),
            }],
            status_fallback: Some(StatusStyleConfig {
                color: "red".to_string(),
                text: "Needs Attention".to_string(),
            }),
            ..ComfortConfig::default()
        };
        let thresholds = comfort.thresholds();
        assert_eq!(thresholds.status.select(95.0).color, "green");
        assert_eq!(thresholds.status.select(85.0).color, "red");
        assert_eq!(thresholds.cold_below, 20.0);
    }

    #[test]
    fn test_translation_overrides() {
        let translations = TranslationsConfig {
            entries: vec![
                TranslationEntryConfig {
                    locale: "es-ES".to_string(),
                    source: "Meeting Room".to_string(),
                    target: "Sala de reuniones".to_string(),
                },
                TranslationEntryConfig {
                    locale: "en".to_string(),
                    source: "Comfort".to_string(),
                    target: "Cozy".to_string(),
                },
            ],
        };
        let table = translations.table();

        assert_eq!(table.translate("Meeting Room", Locale::Es), "Sala de reuniones");
        assert_eq!(table.translate("Comfort", Locale::Es), "Confort");
        assert_eq!(table.translate("Comfort", Locale::En), "Comfort");
    }

    #[test]
    fn test_shipped_reports_config_parses() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../config/reports.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let reports: ReportsConfig = settings.try_deserialize().unwrap();

        assert_eq!(reports.comfort.status_tiers.len(), 2);
        assert_eq!(reports.comfort.thresholds().status.select(85.0).text, "Excellent");
        assert_eq!(reports.comfort.thresholds().status.select(50.0).text, "Needs Attention");
        assert_eq!(reports.ranking.top_n, 3);
        assert!(reports.queries.temperature_avg.contains("${range}"));
    }
}

// Comfort-zone classification and donut/bar chart geometry
use super::record::ReportRecord;
use super::sample::SampleSeries;

/// Donut circumference in SVG stroke-dasharray units
pub const DEFAULT_CIRCUMFERENCE: f64 = 198.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusStyle {
    pub color: String,
    pub text: String,
}

impl StatusStyle {
    pub fn new(color: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusTier {
    pub above: f64,
    pub style: StatusStyle,
}

/// Ordered threshold checks on the comfort percentage.
///
/// Tiers are kept highest-threshold-first and the first tier whose
/// threshold is strictly exceeded wins; `fallback` applies otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusScale {
    tiers: Vec<StatusTier>,
    fallback: StatusStyle,
}

impl StatusScale {
    pub fn new(mut tiers: Vec<StatusTier>, fallback: StatusStyle) -> Self {
        tiers.sort_by(|a, b| b.above.total_cmp(&a.above));
        Self { tiers, fallback }
    }

    pub fn select(&self, comfort_percentage: f64) -> &StatusStyle {
        self.tiers
            .iter()
            .find(|tier| comfort_percentage > tier.above)
            .map(|tier| &tier.style)
            .unwrap_or(&self.fallback)
    }
}

impl Default for StatusScale {
    fn default() -> Self {
        Self::new(
            vec![
                StatusTier {
                    above: 80.0,
                    style: StatusStyle::new("#22c55e", "Excellent"),
                },
                StatusTier {
                    above: 60.0,
                    style: StatusStyle::new("#f59e0b", "Acceptable"),
                },
            ],
            StatusStyle::new("#ef4444", "Needs Attention"),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComfortThresholds {
    /// Readings strictly below this are cold
    pub cold_below: f64,
    /// Readings strictly above this are hot
    pub hot_above: f64,
    /// Critical envelope, counted on top of the cold/hot bands
    pub critical_below: f64,
    pub critical_above: f64,
    pub status: StatusScale,
}

impl Default for ComfortThresholds {
    fn default() -> Self {
        Self {
            cold_below: 20.0,
            hot_above: 26.0,
            critical_below: 16.0,
            critical_above: 30.0,
            status: StatusScale::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub circumference: f64,
    pub bar_max_width: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandCounts {
    pub cold: usize,
    pub comfort: usize,
    pub hot: usize,
    pub critical: usize,
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.cold + self.comfort + self.hot
    }
}

pub fn classify<I>(values: I, thresholds: &ComfortThresholds) -> BandCounts
where
    I: IntoIterator<Item = f64>,
{
    let mut counts = BandCounts::default();
    for value in values.into_iter().filter(|v| v.is_finite()) {
        if value < thresholds.cold_below {
            counts.cold += 1;
        } else if value > thresholds.hot_above {
            counts.hot += 1;
        } else {
            counts.comfort += 1;
        }

        if value < thresholds.critical_below || value > thresholds.critical_above {
            counts.critical += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandPercentages {
    pub cold: f64,
    pub comfort: f64,
    pub hot: f64,
    pub critical: f64,
}

/// Percentages rounded half-up to one decimal place.
///
/// Each band is rounded on its own, so the three bands add up to 100.0
/// give or take 0.1.
pub fn band_percentages(counts: &BandCounts) -> BandPercentages {
    let total = counts.total() as u64;
    if total == 0 {
        return BandPercentages::default();
    }

    let tenths = |count: usize| ((count as u64 * 1000 + total / 2) / total) as f64 / 10.0;

    BandPercentages {
        cold: tenths(counts.cold),
        comfort: tenths(counts.comfort),
        hot: tenths(counts.hot),
        critical: tenths(counts.critical).clamp(0.0, 100.0),
    }
}

/// Unrounded band shares in percent, zero when nothing was classified.
fn band_shares(counts: &BandCounts) -> (f64, f64, f64) {
    let total = counts.total();
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }
    let share = |count: usize| count as f64 * 100.0 / total as f64;
    (share(counts.cold), share(counts.comfort), share(counts.hot))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DonutGeometry {
    pub cold_arc_length: f64,
    pub comfort_arc_length: f64,
    pub hot_arc_length: f64,
    pub cold_arc_offset: f64,
    pub comfort_arc_offset: f64,
    pub hot_arc_offset: f64,
}

/// Stacked donut segments in fixed order: cold, comfort, hot.
pub fn donut_geometry(cold: f64, comfort: f64, hot: f64, circumference: f64) -> DonutGeometry {
    let arc = |pct: f64| pct.clamp(0.0, 100.0) * circumference / 100.0;

    let cold_arc_length = arc(cold);
    let comfort_arc_length = arc(comfort);
    let hot_arc_length = arc(hot);

    DonutGeometry {
        cold_arc_length,
        comfort_arc_length,
        hot_arc_length,
        cold_arc_offset: 0.0,
        comfort_arc_offset: cold_arc_length,
        hot_arc_offset: cold_arc_length + comfort_arc_length,
    }
}

pub fn bar_width(percentage: f64, max_width: f64) -> u32 {
    let width = percentage.clamp(0.0, 100.0) / 100.0 * max_width.max(0.0);
    width.round() as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComfortMetrics {
    pub total_samples: usize,
    pub comfort_percentage: f64,
    pub cold_percentage: f64,
    pub hot_percentage: f64,
    pub critical_percentage: f64,
    pub donut: DonutGeometry,
    pub cold_bar_width: u32,
    pub comfort_bar_width: u32,
    pub hot_bar_width: u32,
    pub status: StatusStyle,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Classify every valid temperature reading across all series.
///
/// Empty or fully malformed input yields all-zero percentages.
pub fn compute_comfort_metrics(
    series: &[SampleSeries],
    thresholds: &ComfortThresholds,
    layout: &ChartLayout,
) -> ComfortMetrics {
    let values: Vec<f64> = series.iter().flat_map(|s| s.values()).collect();

    let counts = classify(values.iter().copied(), thresholds);
    let pct = band_percentages(&counts);
    // Arcs use exact shares so the segments always close the ring
    let (cold_share, comfort_share, hot_share) = band_shares(&counts);
    let donut = donut_geometry(cold_share, comfort_share, hot_share, layout.circumference);

    let (average, min, max) = if values.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = values.iter().sum();
        (
            Some(sum / values.len() as f64),
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        )
    };

    tracing::debug!(
        "Comfort metrics over {} samples: cold={} comfort={} hot={} critical={}",
        counts.total(),
        pct.cold,
        pct.comfort,
        pct.hot,
        pct.critical
    );

    ComfortMetrics {
        total_samples: counts.total(),
        comfort_percentage: pct.comfort,
        cold_percentage: pct.cold,
        hot_percentage: pct.hot,
        critical_percentage: pct.critical,
        donut,
        cold_bar_width: bar_width(pct.cold, layout.bar_max_width),
        comfort_bar_width: bar_width(pct.comfort, layout.bar_max_width),
        hot_bar_width: bar_width(pct.hot, layout.bar_max_width),
        status: thresholds.status.select(pct.comfort).clone(),
        average,
        min,
        max,
    }
}

impl ComfortMetrics {
    pub fn to_record(&self) -> ReportRecord {
        let mut record = ReportRecord::new();
        record.integer("total_samples", self.total_samples as i64);

        record.number("comfort_percentage", self.comfort_percentage, 1);
        record.number("cold_percentage", self.cold_percentage, 1);
        record.number("hot_percentage", self.hot_percentage, 1);
        record.number("critical_percentage", self.critical_percentage, 1);

        record.number("cold_arc_length", self.donut.cold_arc_length, 2);
        record.number("comfort_arc_length", self.donut.comfort_arc_length, 2);
        record.number("hot_arc_length", self.donut.hot_arc_length, 2);
        record.number("cold_arc_offset", self.donut.cold_arc_offset, 2);
        record.number("comfort_arc_offset", self.donut.comfort_arc_offset, 2);
        record.number("hot_arc_offset", self.donut.hot_arc_offset, 2);

        record.integer("cold_bar_width", self.cold_bar_width as i64);
        record.integer("comfort_bar_width", self.comfort_bar_width as i64);
        record.integer("hot_bar_width", self.hot_bar_width as i64);

        record.text("status_color", self.status.color.clone());
        record.text("status_text", self.status.text.clone());

        record.number("avg_temperature", self.average.unwrap_or(0.0), 1);
        record.number("min_temperature", self.min.unwrap_or(0.0), 1);
        record.number("max_temperature", self.max.unwrap_or(0.0), 1);
        record
    }
}

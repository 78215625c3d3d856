// Peak readings with robust alternatives to the raw maximum
//
// Peak-type channels (sound peak dB) pick up ceiling spikes from the sensor
// itself. Nothing is filtered here: the raw maximum is reported next to a
// nearest-rank percentile and a ceiling-clamped maximum, and templates pick.
use super::record::ReportRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPolicy {
    /// Percentile in (0, 100]
    pub percentile: f64,
    /// Readings at or above this are treated as sensor saturation
    pub sensor_ceiling: f64,
}

impl Default for PeakPolicy {
    fn default() -> Self {
        Self {
            percentile: 95.0,
            sensor_ceiling: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakSummary {
    pub sample_count: usize,
    pub raw_max: f64,
    pub percentile_value: f64,
    /// Max of readings below the ceiling; falls back to the percentile when
    /// every reading saturates
    pub clamped_max: f64,
    pub saturated_count: usize,
}

/// Nearest-rank percentile over finite values, `None` for empty input.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pct = pct.clamp(0.0, 100.0);
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}

pub fn summarize_peaks(values: &[f64], policy: &PeakPolicy) -> PeakSummary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(percentile_value) = percentile(&finite, policy.percentile) else {
        return PeakSummary::default();
    };

    let raw_max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let below_ceiling = finite
        .iter()
        .copied()
        .filter(|v| *v < policy.sensor_ceiling)
        .reduce(f64::max);
    let saturated_count = finite.iter().filter(|v| **v >= policy.sensor_ceiling).count();

    if saturated_count > 0 {
        tracing::debug!(
            "{} of {} peak readings at or above sensor ceiling {}",
            saturated_count,
            finite.len(),
            policy.sensor_ceiling
        );
    }

    PeakSummary {
        sample_count: finite.len(),
        raw_max,
        percentile_value,
        clamped_max: below_ceiling.unwrap_or(percentile_value),
        saturated_count,
    }
}

impl PeakSummary {
    pub fn to_record(&self, prefix: &str) -> ReportRecord {
        let mut record = ReportRecord::new();
        record.integer(format!("{}_sample_count", prefix), self.sample_count as i64);
        record.number(format!("{}_raw_max", prefix), self.raw_max, 1);
        record.number(format!("{}_percentile", prefix), self.percentile_value, 1);
        record.number(format!("{}_clamped_max", prefix), self.clamped_max, 1);
        record.integer(format!("{}_saturated_count", prefix), self.saturated_count as i64);
        record
    }
}

// Per-sensor aggregates and hotspot/cold-zone/noise rankings
use super::record::ReportRecord;
use super::sample::{SampleSeries, SensorMeta};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorAggregate {
    pub sensor: SensorMeta,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl SensorAggregate {
    /// `None` when the series has no usable samples.
    pub fn from_series(series: &SampleSeries) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let count = series.points.len();
        let sum: f64 = series.values().sum();
        let min = series.values().fold(f64::INFINITY, f64::min);
        let max = series.values().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            sensor: series.sensor.clone(),
            avg: sum / count as f64,
            min,
            max,
        })
    }

    pub fn from_all(series: &[SampleSeries]) -> Vec<Self> {
        series
            .iter()
            .filter_map(|s| {
                let aggregate = Self::from_series(s);
                if aggregate.is_none() {
                    tracing::warn!("Sensor {} has no samples in range, skipping", s.sensor.id);
                }
                aggregate
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    /// 1-based position
    pub rank: usize,
    pub sensor_id: String,
    pub sensor_name: String,
    pub model: Option<String>,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Sort on the average, ties broken by sensor name, then truncate to `top_n`.
///
/// Aggregates with a non-finite average are left out.
pub fn rank(aggregates: &[SensorAggregate], order: RankOrder, top_n: usize) -> Vec<RankingEntry> {
    let mut sorted: Vec<&SensorAggregate> =
        aggregates.iter().filter(|a| a.avg.is_finite()).collect();

    sorted.sort_by(|a, b| {
        let by_value = match order {
            RankOrder::Descending => b.avg.total_cmp(&a.avg),
            RankOrder::Ascending => a.avg.total_cmp(&b.avg),
        };
        match by_value {
            Ordering::Equal => a.sensor.name.cmp(&b.sensor.name),
            other => other,
        }
    });

    sorted
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, a)| RankingEntry {
            rank: i + 1,
            sensor_id: a.sensor.id.clone(),
            sensor_name: a.sensor.name.clone(),
            model: a.sensor.model.clone(),
            avg: a.avg,
            min: a.min,
            max: a.max,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rankings {
    pub hotspots: Vec<RankingEntry>,
    pub cold_zones: Vec<RankingEntry>,
}

pub fn compute_rankings(aggregates: &[SensorAggregate], top_n: usize) -> Rankings {
    Rankings {
        hotspots: rank(aggregates, RankOrder::Descending, top_n),
        cold_zones: rank(aggregates, RankOrder::Ascending, top_n),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoiseRankings {
    pub noisiest: Vec<RankingEntry>,
    pub quietest: Vec<RankingEntry>,
}

pub fn compute_noise_rankings(aggregates: &[SensorAggregate], top_n: usize) -> NoiseRankings {
    NoiseRankings {
        noisiest: rank(aggregates, RankOrder::Descending, top_n),
        quietest: rank(aggregates, RankOrder::Ascending, top_n),
    }
}

/// Flatten a ranking into `{prefix}_{rank}_{field}` keys.
///
/// Positions up to `slots` that have no entry are filled with a dash so
/// fixed-layout templates never show raw placeholders for short lists.
pub fn ranking_record(prefix: &str, entries: &[RankingEntry], slots: usize) -> ReportRecord {
    let mut record = ReportRecord::new();
    record.integer(format!("{}_count", prefix), entries.len() as i64);

    for position in 1..=slots.max(entries.len()) {
        let key = |field: &str| format!("{}_{}_{}", prefix, position, field);
        match entries.get(position - 1) {
            Some(entry) => {
                record.integer(key("rank"), entry.rank as i64);
                record.text(key("name"), entry.sensor_name.clone());
                record.text(key("id"), entry.sensor_id.clone());
                record.text(key("model"), entry.model.clone().unwrap_or_default());
                record.number(key("avg"), entry.avg, 1);
                record.number(key("min"), entry.min, 1);
                record.number(key("max"), entry.max, 1);
            }
            None => {
                record.integer(key("rank"), position as i64);
                for field in ["name", "id", "model", "avg", "min", "max"] {
                    record.text(key(field), "-");
                }
            }
        }
    }
    record
}

impl Rankings {
    pub fn to_record(&self, slots: usize) -> ReportRecord {
        let mut record = ranking_record("hotspot", &self.hotspots, slots);
        record.extend(ranking_record("coldzone", &self.cold_zones, slots));
        record
    }
}

impl NoiseRankings {
    pub fn to_record(&self, slots: usize) -> ReportRecord {
        let mut record = ranking_record("noisiest", &self.noisiest, slots);
        record.extend(ranking_record("quietest", &self.quietest, slots));
        record
    }
}

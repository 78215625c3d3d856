// Report request domain model
use super::localization::Locale;
use super::record::ReportRecord;
use super::trend::TrendWindow;
use chrono::{DateTime, Duration, Utc};

/// Longest period a single report may cover
pub const MAX_PERIOD_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Comfort,
    Hotspots,
    Trend,
    Noise,
    Power,
}

impl ReportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "comfort" => Some(ReportKind::Comfort),
            "hotspots" => Some(ReportKind::Hotspots),
            "trend" => Some(ReportKind::Trend),
            "noise" => Some(ReportKind::Noise),
            "power" => Some(ReportKind::Power),
            _ => None,
        }
    }

    /// Template file stem in the template store
    pub fn template_name(&self) -> &'static str {
        match self {
            ReportKind::Comfort => "comfort",
            ReportKind::Hotspots => "hotspots",
            ReportKind::Trend => "trend",
            ReportKind::Noise => "noise",
            ReportKind::Power => "power",
        }
    }

    /// English title; translated along with the rest of the document
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Comfort => "Comfort Report",
            ReportKind::Hotspots => "Hotspots Report",
            ReportKind::Trend => "Temperature Trend",
            ReportKind::Noise => "Noise Report",
            ReportKind::Power => "Energy Consumption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Portrait,
    Landscape,
}

impl Layout {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("landscape") {
            Layout::Landscape
        } else {
            Layout::Portrait
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PeriodError {
    #[error("report period must end after it starts ({start} .. {end})")]
    Empty {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("report period may not exceed {} days", MAX_PERIOD_DAYS)]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PeriodError> {
        if end <= start {
            return Err(PeriodError::Empty { start, end });
        }
        if end - start > Duration::days(MAX_PERIOD_DAYS) {
            return Err(PeriodError::TooLong);
        }
        Ok(Self { start, end })
    }

    pub fn last_hours(end: DateTime<Utc>, hours: i64) -> Result<Self, PeriodError> {
        if hours > MAX_PERIOD_DAYS * 24 {
            return Err(PeriodError::TooLong);
        }
        Self::new(end - Duration::hours(hours), end)
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn window(&self) -> TrendWindow {
        TrendWindow::new(self.start.timestamp_millis(), self.end.timestamp_millis())
    }

    pub fn to_record(&self) -> ReportRecord {
        let mut record = ReportRecord::new();
        record.text("period_from", self.start.format("%d/%m/%Y %H:%M").to_string());
        record.text("period_to", self.end.format("%d/%m/%Y %H:%M").to_string());
        record.integer("period_hours", (self.end - self.start).num_hours());
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRequest {
    pub period: ReportPeriod,
    pub locale: Locale,
    pub layout: Layout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_parse() {
        assert_eq!(ReportKind::parse("Comfort"), Some(ReportKind::Comfort));
        assert_eq!(ReportKind::parse("power"), Some(ReportKind::Power));
        assert_eq!(ReportKind::parse("weather"), None);
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!(Layout::parse("LANDSCAPE"), Layout::Landscape);
        assert_eq!(Layout::parse("anything"), Layout::Portrait);
    }

    #[test]
    fn test_period_validation() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();

        let period = ReportPeriod::new(start, end).unwrap();
        assert_eq!(period.duration_seconds(), 86_400);
        assert_eq!(period.window().duration_ms(), 86_400_000);

        assert!(matches!(ReportPeriod::new(end, start), Err(PeriodError::Empty { .. })));
        assert_eq!(
            ReportPeriod::new(start, start + Duration::days(400)),
            Err(PeriodError::TooLong)
        );
    }

    #[test]
    fn test_period_record() {
        let end = Utc.with_ymd_and_hms(2025, 3, 2, 12, 30, 0).unwrap();
        let record = ReportPeriod::last_hours(end, 24).unwrap().to_record();
        assert_eq!(
            record.get("period_from").map(|v| v.render()),
            Some("01/03/2025 12:30".to_string())
        );
        assert_eq!(record.get("period_hours").map(|v| v.render()), Some("24".to_string()));
    }
}

// HTTP request handlers
use crate::application::report_service::ReportError;
use crate::application::template_store::TemplateStoreError;
use crate::domain::localization::Locale;
use crate::domain::report::{Layout, PeriodError, ReportKind, ReportPeriod, ReportRequest};
use crate::domain::sample::SensorMeta;
use crate::infrastructure::http_response::{accepts_brotli, document_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_HOURS: i64 = 24;

#[derive(Debug, Deserialize, Default)]
pub struct ReportQuery {
    pub hours: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub lang: Option<String>,
    pub layout: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RequestError {
    #[error("invalid timestamp '{0}', expected RFC 3339")]
    Timestamp(String),
    #[error("'hours' must be positive")]
    Hours,
    #[error(transparent)]
    Period(#[from] PeriodError),
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, RequestError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| RequestError::Timestamp(raw.to_string()))
}

impl ReportQuery {
    /// `from`/`to` win over `hours`; a missing `to` means now
    pub fn period(&self, now: DateTime<Utc>) -> Result<ReportPeriod, RequestError> {
        let end = match &self.to {
            Some(to) => parse_time(to)?,
            None => now,
        };

        match &self.from {
            Some(from) => Ok(ReportPeriod::new(parse_time(from)?, end)?),
            None => {
                let hours = self.hours.unwrap_or(DEFAULT_HOURS);
                if hours <= 0 {
                    return Err(RequestError::Hours);
                }
                Ok(ReportPeriod::last_hours(end, hours)?)
            }
        }
    }

    pub fn to_request(&self, now: DateTime<Utc>) -> Result<ReportRequest, RequestError> {
        Ok(ReportRequest {
            period: self.period(now)?,
            locale: self.lang.as_deref().map(Locale::parse).unwrap_or_default(),
            layout: self.layout.as_deref().map(Layout::parse).unwrap_or_default(),
        })
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List sensors with data in the requested period
pub async fn list_sensors(
    Query(query): Query<ReportQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SensorMeta>>, (StatusCode, String)> {
    let period = query
        .period(Utc::now())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .sensor_service
        .list_sensors(&period)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error discovering sensors: {:#}", e);
            (StatusCode::BAD_GATEWAY, "time-series backend unavailable".to_string())
        })
}

/// List sensor types known to the backend
pub async fn list_sensor_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    state
        .sensor_service
        .list_sensor_types()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error listing sensor types: {:#}", e);
            (StatusCode::BAD_GATEWAY, "time-series backend unavailable".to_string())
        })
}

fn report_error_status(error: &ReportError) -> StatusCode {
    match error {
        ReportError::Template(TemplateStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        ReportError::Template(_) | ReportError::Backend(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Render a report document for the requested period and locale
pub async fn render_report(
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(kind) = ReportKind::parse(&kind) else {
        return (StatusCode::NOT_FOUND, format!("unknown report '{}'", kind)).into_response();
    };

    let request = match query.to_request(Utc::now()) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.report_service.build(kind, &request).await {
        Ok(document) => match document_response(document, accepts_brotli(&headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!("Error building {} report: {}", kind.template_name(), e);
            (report_error_status(&e), e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_period_is_last_day() {
        let period = ReportQuery::default().period(now()).unwrap();
        assert_eq!(period.end, now());
        assert_eq!(period.start, now() - Duration::hours(24));
    }

    #[test]
    fn test_explicit_range() {
        let query = ReportQuery {
            from: Some("2025-03-01T00:00:00Z".to_string()),
            to: Some("2025-03-01T06:00:00+01:00".to_string()),
            ..ReportQuery::default()
        };
        let period = query.period(now()).unwrap();
        assert_eq!(period.duration_seconds(), 5 * 3600);
    }

    #[test]
    fn test_invalid_inputs() {
        let bad_time = ReportQuery {
            from: Some("yesterday".to_string()),
            ..ReportQuery::default()
        };
        assert_eq!(bad_time.period(now()), Err(RequestError::Timestamp("yesterday".to_string())));

        let bad_hours = ReportQuery {
            hours: Some(0),
            ..ReportQuery::default()
        };
        assert_eq!(bad_hours.period(now()), Err(RequestError::Hours));

        let huge_hours = ReportQuery {
            hours: Some(i64::MAX),
            ..ReportQuery::default()
        };
        assert_eq!(
            huge_hours.period(now()),
            Err(RequestError::Period(PeriodError::TooLong))
        );

        let reversed = ReportQuery {
            from: Some("2025-03-02T00:00:00Z".to_string()),
            to: Some("2025-03-01T00:00:00Z".to_string()),
            ..ReportQuery::default()
        };
        assert!(matches!(
            reversed.period(now()),
            Err(RequestError::Period(PeriodError::Empty { .. }))
        ));
    }

    #[test]
    fn test_request_locale_and_layout() {
        let query = ReportQuery {
            lang: Some("es-ES".to_string()),
            layout: Some("landscape".to_string()),
            ..ReportQuery::default()
        };
        let request = query.to_request(now()).unwrap();
        assert_eq!(request.locale, Locale::Es);
        assert_eq!(request.layout, Layout::Landscape);

        let fallback = ReportQuery {
            lang: Some("pt-BR".to_string()),
            ..ReportQuery::default()
        }
        .to_request(now())
        .unwrap();
        assert_eq!(fallback.locale, Locale::En);
        assert_eq!(fallback.layout, Layout::Portrait);
    }
}

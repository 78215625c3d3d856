// Application state for HTTP handlers
use crate::application::report_service::ReportService;
use crate::application::sensor_service::SensorService;

#[derive(Clone)]
pub struct AppState {
    pub sensor_service: SensorService,
    pub report_service: ReportService,
}

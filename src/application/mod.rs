// Application layer - Ports and report use cases
pub mod report_service;
pub mod sensor_service;
pub mod telemetry_repository;
pub mod template_store;

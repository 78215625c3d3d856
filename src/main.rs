// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::report_service::ReportService;
use crate::application::sensor_service::SensorService;
use crate::domain::template::TemplateRenderer;
use crate::infrastructure::config::{load_app_config, load_reports_config, load_translations_config};
use crate::infrastructure::file_template_store::FileTemplateStore;
use crate::infrastructure::prometheus_repository::PrometheusRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, list_sensor_types, list_sensors, render_report};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let app_config = load_app_config()?;
    let reports_config = load_reports_config()?;
    let translations = Arc::new(load_translations_config()?.table());
    tracing::info!("Loaded {} translation entries", translations.len());

    // Create adapters (infrastructure layer)
    let repository = Arc::new(PrometheusRepository::new(
        app_config.prometheus.host,
        app_config.prometheus.token,
        Duration::from_secs(app_config.prometheus.timeout_seconds),
    )?);
    let templates = Arc::new(FileTemplateStore::new(app_config.server.templates_dir));

    // Create services (application layer)
    let sensor_service = SensorService::new(repository.clone(), app_config.server.sensor_matcher);
    let report_service = ReportService::new(
        repository,
        templates,
        TemplateRenderer::new(translations),
        reports_config,
    );

    // Create application state
    let state = Arc::new(AppState {
        sensor_service,
        report_service,
    });

    // Build router (presentation layer)
    // Documents are compressed in the response builder, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/sensors", get(list_sensors))
        .route("/sensor-types", get(list_sensor_types))
        .route("/reports/:kind", get(render_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!("Starting sensor-reports service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}

// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_template_store;
pub mod http_response;
pub mod prometheus_repository;

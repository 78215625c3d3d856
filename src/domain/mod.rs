// Domain layer - Report computations with no I/O
pub mod comfort;
pub mod localization;
pub mod peak;
pub mod ranking;
pub mod record;
pub mod report;
pub mod sample;
pub mod template;
pub mod trend;

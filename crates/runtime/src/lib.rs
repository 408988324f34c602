pub mod acceptance;
pub mod aggregate;
pub mod config;
pub mod driver;
pub mod event_log;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod run_id;
pub mod service;
pub mod ticket;

pub use config::{NotificationMode, PoolConfigError, PoolDefinition, PoolSettings};
pub use driver::{PoolDriver, PoolRunReport};
pub use orchestrator::{BenchmarkOrchestrator, BenchmarkReport, PoolOutcome};

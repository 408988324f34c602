mod notified;
mod polling;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

use crate::acceptance::AcceptanceSimulator;
use crate::config::{NotificationMode, PoolDefinition};
use crate::event_log::{EventLog, EventLogError};
use crate::logging::TracingRunLogWriter;
use crate::metrics::PoolRunStats;
use crate::registry::TicketRegistry;
use crate::service::MatchmakingService;

pub use notified::EventLogMonitor;
pub use polling::{Observation, PollingMonitor};

#[derive(Debug)]
pub enum MonitorError {
    Join(JoinError),
    EventLog(EventLogError),
}

impl Display for MonitorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join(err) => write!(f, "monitor task failed: {err}"),
            Self::EventLog(err) => write!(f, "event log aggregation failed: {err}"),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<JoinError> for MonitorError {
    fn from(err: JoinError) -> Self {
        Self::Join(err)
    }
}

impl From<EventLogError> for MonitorError {
    fn from(err: EventLogError) -> Self {
        Self::EventLog(err)
    }
}

/// Tracks a pool's tickets until they resolve. Polling runs in its own task
/// from the start of submission; the event-log variant runs when finished.
pub enum LifecycleMonitor {
    Polling(JoinHandle<PoolRunStats>),
    EventLog(EventLogMonitor),
}

impl LifecycleMonitor {
    pub fn start(
        pool: &PoolDefinition,
        key_prefix: &str,
        service: Arc<dyn MatchmakingService>,
        event_log: Option<Arc<dyn EventLog>>,
        registry: Arc<TicketRegistry>,
        seed: Option<u64>,
    ) -> Self {
        let settings = &pool.settings;
        match (settings.notification_mode, event_log) {
            (NotificationMode::Event, Some(log)) => Self::EventLog(EventLogMonitor::new(
                pool.name.as_str(),
                key_prefix,
                log,
                registry,
                settings.poll_interval(),
                settings.event_log_wait(),
            )),
            (mode, _) => {
                if mode == NotificationMode::Event {
                    warn!(
                        pool = pool.name.as_str(),
                        "event notification mode without an event log, falling back to polling"
                    );
                }
                let monitor = PollingMonitor::new(
                    service,
                    registry,
                    AcceptanceSimulator::new(settings.acceptance_rate),
                    settings.acceptance_timeout(),
                    settings.poll_interval(),
                    TracingRunLogWriter::new(pool.name.as_str()),
                );
                let monitor = match seed {
                    Some(seed) => monitor.with_seed(seed),
                    None => monitor,
                };
                Self::Polling(tokio::spawn(monitor.run()))
            }
        }
    }

    pub fn mode(&self) -> NotificationMode {
        match self {
            Self::Polling(_) => NotificationMode::Polling,
            Self::EventLog(_) => NotificationMode::Event,
        }
    }

    pub async fn finish(self) -> Result<PoolRunStats, MonitorError> {
        match self {
            Self::Polling(handle) => Ok(handle.await?),
            Self::EventLog(monitor) => Ok(monitor.run().await?),
        }
    }
}

use std::sync::Arc;

use runtime::event_log::{EventLog, EventLogError, InMemoryEventLog, JsonlEventLog};
use runtime::service::{
    HttpMatchmakingService, MatchmakingService, SimulatedBehavior, SimulatedMatchmakingService,
};

use crate::config::{Config, ConfigError, ServiceKind};

pub struct Wiring {
    pub service: Arc<dyn MatchmakingService>,
    pub event_log: Arc<dyn EventLog>,
    simulated_events: Option<Arc<InMemoryEventLog>>,
    event_log_path: String,
}

impl Wiring {
    /// Copies the simulated service's in-memory events into the JSON-lines
    /// log so a later result run can read them back. No-op for http runs,
    /// where the notification pipeline writes that log.
    pub async fn persist_simulated_events(&self) -> Result<usize, EventLogError> {
        let Some(memory) = &self.simulated_events else {
            return Ok(0);
        };
        let records = memory.records().await;
        JsonlEventLog::new(self.event_log_path.as_str())
            .append(&records)
            .await?;
        Ok(records.len())
    }
}

/// The simulated service publishes its own events, so event mode reads them
/// back from memory. Against the real service the notification pipeline
/// writes the JSON-lines log.
pub fn build(config: &Config) -> Result<Wiring, ConfigError> {
    match config.service {
        ServiceKind::Simulated => {
            let sink = Arc::new(InMemoryEventLog::new());
            let service = SimulatedMatchmakingService::new(SimulatedBehavior::default())
                .with_event_sink(Arc::clone(&sink));
            Ok(Wiring {
                service: Arc::new(service),
                event_log: sink.clone(),
                simulated_events: Some(sink),
                event_log_path: config.event_log_path.clone(),
            })
        }
        ServiceKind::Http => {
            let service = HttpMatchmakingService::new(&config.service_url)
                .map_err(ConfigError::ServiceSetup)?;
            Ok(Wiring {
                service: Arc::new(service),
                event_log: Arc::new(JsonlEventLog::new(config.event_log_path.as_str())),
                simulated_events: None,
                event_log_path: config.event_log_path.clone(),
            })
        }
    }
}

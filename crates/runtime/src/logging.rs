use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    TicketSubmitted,
    StatusObserved,
    AcceptanceSimulated,
    AcceptanceExpired,
    TicketResolved,
    ObservationFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEvent {
    pub ticket_id: String,
    pub kind: RunLogEventKind,
    pub status: Option<String>,
    pub elapsed_secs: Option<f64>,
}

impl RunLogEvent {
    pub fn new(ticket_id: impl Into<String>, kind: RunLogEventKind) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            kind,
            status: None,
            elapsed_secs: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_elapsed_secs(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn count(&self, kind: RunLogEventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards run events to the structured log, tagged with the pool name.
#[derive(Debug, Clone)]
pub struct TracingRunLogWriter {
    pool_name: String,
}

impl TracingRunLogWriter {
    pub fn new(pool_name: impl Into<String>) -> Self {
        Self {
            pool_name: pool_name.into(),
        }
    }
}

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        let pool = self.pool_name.as_str();
        let ticket_id = event.ticket_id.as_str();
        let status = event.status.as_deref().unwrap_or("-");
        match event.kind {
            RunLogEventKind::TicketSubmitted => info!(pool, ticket_id, "ticket submitted"),
            RunLogEventKind::StatusObserved => info!(pool, ticket_id, status, "ticket status"),
            RunLogEventKind::AcceptanceSimulated => {
                info!(pool, ticket_id, outcome = status, "acceptance simulated")
            }
            RunLogEventKind::AcceptanceExpired => {
                warn!(pool, ticket_id, "pending acceptance expired")
            }
            RunLogEventKind::TicketResolved => info!(
                pool,
                ticket_id,
                status,
                elapsed_secs = event.elapsed_secs.unwrap_or_default(),
                "ticket resolved"
            ),
            RunLogEventKind::ObservationFailed => {
                warn!(pool, ticket_id, error = status, "describe ticket failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::{
        InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter,
    };

    /// Records the level of every event it sees.
    #[derive(Clone, Default)]
    struct LevelRecorder {
        levels: Arc<Mutex<Vec<Level>>>,
    }

    impl<S: Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.levels.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn levels_of(events: Vec<RunLogEvent>) -> Vec<Level> {
        let recorder = LevelRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mut writer = TracingRunLogWriter::new("Classic1");
            for event in events {
                writer.write(event);
            }
        });
        let levels = recorder.levels.lock().unwrap().clone();
        levels
    }

    #[test]
    fn status_observations_are_logged_at_info() {
        let levels = levels_of(vec![
            RunLogEvent::new("t-1", RunLogEventKind::TicketSubmitted),
            RunLogEvent::new("t-1", RunLogEventKind::StatusObserved).with_status("SEARCHING"),
            RunLogEvent::new("t-1", RunLogEventKind::AcceptanceExpired),
        ]);

        assert_eq!(levels, vec![Level::INFO, Level::INFO, Level::WARN]);
    }

    #[test]
    fn in_memory_writer_counts_by_kind() {
        let mut writer = InMemoryRunLogWriter::new();
        writer.write(RunLogEvent::new("t-1", RunLogEventKind::StatusObserved).with_status("SEARCHING"));
        writer.write(RunLogEvent::new("t-1", RunLogEventKind::StatusObserved).with_status("COMPLETED"));
        writer.write(
            RunLogEvent::new("t-1", RunLogEventKind::TicketResolved)
                .with_status("COMPLETED")
                .with_elapsed_secs(4.0),
        );

        assert_eq!(writer.count(RunLogEventKind::StatusObserved), 2);
        assert_eq!(writer.count(RunLogEventKind::TicketResolved), 1);
        assert_eq!(writer.events()[2].elapsed_secs, Some(4.0));
    }
}

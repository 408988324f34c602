use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::aggregate::stats_from_event_log;
use crate::event_log::{EventLog, EventLogError};
use crate::events::MatchEventType;
use crate::metrics::PoolRunStats;
use crate::registry::TicketRegistry;

/// Resolves a pool's tickets from the event log instead of describing them.
/// Waits for submission to finish, then polls the log until every submitted
/// ticket has a terminal record or the readiness wait runs out.
pub struct EventLogMonitor {
    pool_name: String,
    key_prefix: String,
    log: Arc<dyn EventLog>,
    registry: Arc<TicketRegistry>,
    poll_interval: Duration,
    readiness_wait: Duration,
}

impl EventLogMonitor {
    pub fn new(
        pool_name: impl Into<String>,
        key_prefix: impl Into<String>,
        log: Arc<dyn EventLog>,
        registry: Arc<TicketRegistry>,
        poll_interval: Duration,
        readiness_wait: Duration,
    ) -> Self {
        Self {
            pool_name: pool_name.into(),
            key_prefix: key_prefix.into(),
            log,
            registry,
            poll_interval,
            readiness_wait,
        }
    }

    async fn resolve_logged_tickets(&self) -> Result<usize, EventLogError> {
        let mut logged = HashSet::new();
        for event_types in [&MatchEventType::SUCCESS[..], &MatchEventType::FAILURES[..]] {
            for record in self.log.query(&self.key_prefix, event_types).await? {
                logged.insert(record.ticket_id);
            }
        }

        let mut resolved = 0;
        for ticket_id in logged {
            if self.registry.remove(&ticket_id).await {
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    pub async fn run(self) -> Result<PoolRunStats, EventLogError> {
        while !self.registry.is_submission_finished() {
            sleep(self.poll_interval).await;
        }

        let deadline = Instant::now() + self.readiness_wait;
        loop {
            self.resolve_logged_tickets().await?;
            if self.registry.active_count().await == 0 || Instant::now() >= deadline {
                break;
            }
            sleep(self.poll_interval.min(deadline.saturating_duration_since(Instant::now()))).await;
        }

        let mut stats = stats_from_event_log(self.log.as_ref(), &self.key_prefix).await?;
        let unresolved = self.registry.active_count().await;
        if unresolved > 0 {
            warn!(
                pool = self.pool_name.as_str(),
                unresolved, "event log has no terminal record for some tickets"
            );
            stats.mark_unresolved(unresolved);
        }
        info!(
            pool = self.pool_name.as_str(),
            completed = stats.completed(),
            failed = stats.failed(),
            "event log aggregation finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::EventLogMonitor;
    use crate::event_log::InMemoryEventLog;
    use crate::events::{EventRecord, MatchEventType};
    use crate::registry::TicketRegistry;

    fn monitor(log: Arc<InMemoryEventLog>, registry: Arc<TicketRegistry>) -> EventLogMonitor {
        EventLogMonitor::new(
            "Classic1",
            "bench-4-Classic1-",
            log,
            registry,
            Duration::from_secs(3),
            Duration::from_secs(30),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_late_records() {
        let log = Arc::new(InMemoryEventLog::new());
        let registry = Arc::new(TicketRegistry::new());
        registry.register("bench-4-Classic1-aaaa").await;
        registry.register("bench-4-Classic1-bbbb").await;
        registry.finish_submission();
        log.append([EventRecord::new(
            "bench-4-Classic1-aaaa",
            MatchEventType::MatchmakingSucceeded,
            5.0,
        )])
        .await;

        let late_log = Arc::clone(&log);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            late_log
                .append([EventRecord::new(
                    "bench-4-Classic1-bbbb",
                    MatchEventType::MatchmakingFailed,
                    9.0,
                )])
                .await;
        });

        let stats = monitor(log, Arc::clone(&registry)).run().await.unwrap();

        assert_eq!(stats.completed(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.unresolved(), 0);
        assert!(registry.is_drained().await);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_records_are_unresolved_after_wait() {
        let log = Arc::new(InMemoryEventLog::new());
        let registry = Arc::new(TicketRegistry::new());
        registry.register("bench-4-Classic1-aaaa").await;
        registry.finish_submission();

        let started = tokio::time::Instant::now();
        let stats = monitor(log, registry).run().await.unwrap();

        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.unresolved(), 1);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}

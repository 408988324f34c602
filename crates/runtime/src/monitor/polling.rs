use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use time::OffsetDateTime;
use tokio::time::{sleep, Instant};

use crate::acceptance::{AcceptanceOutcome, AcceptanceSimulator};
use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};
use crate::metrics::PoolRunStats;
use crate::registry::TicketRegistry;
use crate::service::MatchmakingService;
use crate::ticket::{TicketDescription, TicketOutcome, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The ticket is no longer active, so the status is not counted again.
    Ignored,
    Resolved(TicketOutcome),
    AcceptanceSimulated { success: bool },
    AcceptancePending,
    InProgress,
}

/// Describes every active ticket once per cycle and folds terminal statuses
/// into the pool's run stats.
pub struct PollingMonitor<L: RunLogWriter> {
    service: Arc<dyn MatchmakingService>,
    registry: Arc<TicketRegistry>,
    acceptance: AcceptanceSimulator,
    acceptance_timeout: Duration,
    poll_interval: Duration,
    pending: HashMap<String, Instant>,
    expired: HashSet<String>,
    stats: PoolRunStats,
    log: L,
    rng: StdRng,
}

impl<L: RunLogWriter> PollingMonitor<L> {
    pub fn new(
        service: Arc<dyn MatchmakingService>,
        registry: Arc<TicketRegistry>,
        acceptance: AcceptanceSimulator,
        acceptance_timeout: Duration,
        poll_interval: Duration,
        log: L,
    ) -> Self {
        Self {
            service,
            registry,
            acceptance,
            acceptance_timeout,
            poll_interval,
            pending: HashMap::new(),
            expired: HashSet::new(),
            stats: PoolRunStats::new(),
            log,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn stats(&self) -> &PoolRunStats {
        &self.stats
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub async fn observe(&mut self, description: TicketDescription) -> Observation {
        let ticket_id = description.ticket_id.as_str();
        if !self.registry.contains(ticket_id).await {
            return Observation::Ignored;
        }
        self.log.write(
            RunLogEvent::new(ticket_id, RunLogEventKind::StatusObserved)
                .with_status(description.status.as_str()),
        );

        if let Some(outcome) = description.status.outcome() {
            if !self.registry.remove(ticket_id).await {
                return Observation::Ignored;
            }
            self.pending.remove(ticket_id);
            self.expired.remove(ticket_id);

            let elapsed_secs = description.elapsed_secs(OffsetDateTime::now_utc());
            self.stats.record(outcome, elapsed_secs);
            self.log.write(
                RunLogEvent::new(ticket_id, RunLogEventKind::TicketResolved)
                    .with_status(description.status.as_str())
                    .with_elapsed_secs(elapsed_secs),
            );
            return Observation::Resolved(outcome);
        }

        if description.status != TicketStatus::RequiresAcceptance {
            // Leaving the acceptance step ends an expired episode; the next
            // proposal is simulated again.
            self.expired.remove(ticket_id);
            return Observation::InProgress;
        }
        if self.pending.contains_key(ticket_id) || self.expired.contains(ticket_id) {
            return Observation::AcceptancePending;
        }

        self.pending.insert(ticket_id.to_string(), Instant::now());
        let plan = self.acceptance.plan(&description.player_ids, &mut self.rng);
        let delay = self.acceptance.response_delay(&mut self.rng);
        let outcome = self
            .acceptance
            .resolve(self.service.as_ref(), ticket_id, plan, delay)
            .await;

        let label = match &outcome {
            AcceptanceOutcome::Accepted { .. } => "accepted".to_string(),
            AcceptanceOutcome::Rejected { .. } => "rejected".to_string(),
            AcceptanceOutcome::Skipped => "skipped".to_string(),
            AcceptanceOutcome::DecisionFailed { decision, error } => {
                format!("{} failed: {error}", decision.as_str())
            }
        };
        self.log.write(
            RunLogEvent::new(ticket_id, RunLogEventKind::AcceptanceSimulated).with_status(label),
        );
        Observation::AcceptanceSimulated {
            success: outcome.is_success(),
        }
    }

    /// Drops pending acceptances that have waited longer than the acceptance
    /// timeout. The ticket
    /// itself stays active until the service reports a terminal status.
    pub fn expire_pending_acceptances(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.acceptance_timeout;
        let mut expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, started)| now.saturating_duration_since(**started) > timeout)
            .map(|(ticket_id, _)| ticket_id.clone())
            .collect();
        expired.sort();

        for ticket_id in &expired {
            self.pending.remove(ticket_id);
            self.expired.insert(ticket_id.clone());
            self.log
                .write(RunLogEvent::new(ticket_id.as_str(), RunLogEventKind::AcceptanceExpired));
        }
        expired
    }

    pub async fn run_cycle(&mut self) {
        self.expire_pending_acceptances(Instant::now());

        for ticket_id in self.registry.active_ids().await {
            match self.service.describe_ticket(&ticket_id).await {
                Ok(description) => {
                    self.observe(description).await;
                }
                Err(error) => self.log.write(
                    RunLogEvent::new(ticket_id.as_str(), RunLogEventKind::ObservationFailed)
                        .with_status(error.to_string()),
                ),
            }
        }
    }

    pub async fn run(mut self) -> PoolRunStats {
        loop {
            self.run_cycle().await;
            if self.registry.is_drained().await {
                break;
            }
            sleep(self.poll_interval).await;
        }
        self.stats
    }
}

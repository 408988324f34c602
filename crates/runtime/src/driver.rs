use std::sync::Arc;
use std::time::Duration;

use population::{
    select_game_modes, split_into_batches, team_size_limit, PopulationGenerator, PopulationSpec,
};
use rand::{rngs::StdRng, SeedableRng};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::aggregate::PoolSummary;
use crate::config::PoolDefinition;
use crate::event_log::EventLog;
use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter};
use crate::metrics::PoolRunStats;
use crate::monitor::LifecycleMonitor;
use crate::registry::TicketRegistry;
use crate::service::MatchmakingService;
use crate::ticket::{generate_ticket_id, ticket_key_prefix, TicketRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct PoolRunReport {
    pub pool_name: String,
    pub logs: String,
    pub total_players: usize,
    pub batches: usize,
    pub submitted: usize,
    pub submission_error: Option<String>,
    pub monitor_error: Option<String>,
    pub summary: PoolSummary,
    pub elapsed: Duration,
}

impl PoolRunReport {
    pub fn average_batch_secs(&self) -> f64 {
        if self.batches == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() / self.batches as f64
    }
}

/// Generates one pool's population, submits it batch by batch and waits for
/// the monitor to account for every ticket.
pub struct PoolDriver {
    pool: PoolDefinition,
    run_id: u64,
    service: Arc<dyn MatchmakingService>,
    event_log: Option<Arc<dyn EventLog>>,
    seed: Option<u64>,
}

impl PoolDriver {
    pub fn new(pool: PoolDefinition, run_id: u64, service: Arc<dyn MatchmakingService>) -> Self {
        Self {
            pool,
            run_id,
            service,
            event_log: None,
            seed: None,
        }
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn EventLog>) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn pool_name(&self) -> &str {
        &self.pool.name
    }

    pub async fn run(self) -> PoolRunReport {
        let started = Instant::now();
        let pool = &self.pool;
        let settings = &pool.settings;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut run_log = TracingRunLogWriter::new(pool.name.as_str());

        let (spec, skipped) = PopulationSpec::from_player_data(&settings.player_attribute_distributions);
        for attribute in skipped {
            warn!(
                pool = pool.name.as_str(),
                attribute = attribute.name.as_str(),
                reason = attribute.reason,
                "skipping player attribute"
            );
        }
        let id_namespace = format!("{}{}-{}", settings.id_prefix, self.run_id, pool.name);
        let players = PopulationGenerator::new(spec)
            .with_id_namespace(id_namespace)
            .generate(settings.total_players, &mut rng);
        let limit = team_size_limit(&pool.name, settings.team_size_default, settings.team_size_small);
        let batches = split_into_batches(players, limit, &mut rng);
        let batch_count = batches.len();

        let key_prefix = ticket_key_prefix(&settings.id_prefix, self.run_id, &pool.name);
        let registry = Arc::new(TicketRegistry::new());
        let monitor = LifecycleMonitor::start(
            pool,
            &key_prefix,
            Arc::clone(&self.service),
            self.event_log.clone(),
            Arc::clone(&registry),
            self.seed.map(|seed| seed.wrapping_add(1)),
        );
        info!(
            pool = pool.name.as_str(),
            players = settings.total_players,
            batches = batch_count,
            mode = monitor.mode().as_str(),
            "pool run started"
        );

        let mut submission_error = None;
        for (index, batch) in batches.iter().enumerate() {
            let selection = select_game_modes(&pool.name, &settings.game_modes, &mut rng);
            let request = TicketRequest::new(
                generate_ticket_id(&key_prefix, &mut rng),
                pool.name.as_str(),
                batch,
                &selection.modes,
            );

            match self.service.start_matchmaking(&request).await {
                Ok(ticket_id) => {
                    run_log.write(RunLogEvent::new(ticket_id.as_str(), RunLogEventKind::TicketSubmitted));
                    registry.register(ticket_id).await;
                }
                Err(err) => {
                    warn!(
                        pool = pool.name.as_str(),
                        batch = index,
                        error = %err,
                        "ticket submission failed, skipping remaining batches"
                    );
                    submission_error = Some(err.to_string());
                    break;
                }
            }

            if index + 1 < batch_count {
                sleep(selection.pacing.sample(&mut rng)).await;
            }
        }
        registry.finish_submission();

        let (summary, monitor_error) = match monitor.finish().await {
            Ok(stats) => (PoolSummary::from_stats(&stats), None),
            Err(err) => {
                warn!(pool = pool.name.as_str(), error = %err, "monitor did not finish cleanly");
                let mut stats = PoolRunStats::new();
                stats.mark_unresolved(registry.active_count().await);
                (PoolSummary::from_stats(&stats), Some(err.to_string()))
            }
        };

        let report = PoolRunReport {
            pool_name: pool.name.clone(),
            logs: settings.logs.clone(),
            total_players: settings.total_players,
            batches: batch_count,
            submitted: registry.submitted(),
            submission_error,
            monitor_error,
            summary,
            elapsed: started.elapsed(),
        };
        info!(
            pool = report.pool_name.as_str(),
            completed = report.summary.completed,
            failed = report.summary.failed,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "pool run finished"
        );
        report
    }
}

use std::sync::Arc;
use std::time::Duration;

use population::{select_game_modes, Player, PopulationGenerator, PopulationSpec};
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::aggregate::{stats_from_event_log, PoolSummary};
use crate::config::PoolDefinition;
use crate::driver::{PoolDriver, PoolRunReport};
use crate::event_log::{EventLog, EventLogError};
use crate::service::MatchmakingService;
use crate::ticket::ticket_key_prefix;

#[derive(Debug, Clone, PartialEq)]
pub enum PoolOutcome {
    Finished(PoolRunReport),
    /// The pool's task panicked; sibling pools are unaffected.
    Crashed { pool_name: String, error: String },
}

impl PoolOutcome {
    pub fn pool_name(&self) -> &str {
        match self {
            Self::Finished(report) => &report.pool_name,
            Self::Crashed { pool_name, .. } => pool_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub run_id: u64,
    pub pools: Vec<PoolOutcome>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledPlayer {
    pub pool_name: String,
    #[serde(flatten)]
    pub player: Player,
    pub game_modes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolResult {
    pub pool_name: String,
    pub logs: String,
    pub summary: PoolSummary,
}

pub struct BenchmarkOrchestrator {
    pools: Vec<PoolDefinition>,
    service: Arc<dyn MatchmakingService>,
    event_log: Option<Arc<dyn EventLog>>,
    seed: Option<u64>,
}

impl BenchmarkOrchestrator {
    pub fn new(pools: Vec<PoolDefinition>, service: Arc<dyn MatchmakingService>) -> Self {
        Self {
            pools,
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

    pub fn pools(&self) -> &[PoolDefinition] {
        &self.pools
    }

    /// Runs every pool concurrently and returns their outcomes in pool order.
    pub async fn run(&self, run_id: u64) -> BenchmarkReport {
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for (index, pool) in self.pools.iter().enumerate() {
            let mut driver = PoolDriver::new(pool.clone(), run_id, Arc::clone(&self.service));
            if let Some(log) = &self.event_log {
                driver = driver.with_event_log(Arc::clone(log));
            }
            if let Some(seed) = self.seed {
                driver = driver.with_seed(seed.wrapping_add(index as u64 * 1_000));
            }
            let pool_name = pool.name.clone();

            tasks.spawn(async move {
                // Inner task so a panicking driver still reports its pool name.
                let outcome = match tokio::spawn(driver.run()).await {
                    Ok(report) => PoolOutcome::Finished(report),
                    Err(err) => PoolOutcome::Crashed {
                        pool_name,
                        error: err.to_string(),
                    },
                };
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(self.pools.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(err) => error!(error = %err, "pool task failed to join"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let report = BenchmarkReport {
            run_id,
            pools: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
            elapsed: started.elapsed(),
        };
        info!(
            run_id,
            pools = report.pools.len(),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "benchmark finished"
        );
        report
    }

    /// Generates `size` players per pool with their game modes, without
    /// submitting anything.
    pub fn sample(&self, size: usize, rng: &mut impl Rng) -> Vec<SampledPlayer> {
        let mut sampled = Vec::with_capacity(size * self.pools.len());
        for pool in &self.pools {
            let settings = &pool.settings;
            let (spec, _) = PopulationSpec::from_player_data(&settings.player_attribute_distributions);
            let mut generator = PopulationGenerator::new(spec);
            for player in generator.generate(size, rng) {
                let selection = select_game_modes(&pool.name, &settings.game_modes, rng);
                sampled.push(SampledPlayer {
                    pool_name: pool.name.clone(),
                    player,
                    game_modes: selection.modes,
                });
            }
        }
        sampled
    }

    /// Aggregates a finished run from the event log, one summary per pool.
    pub async fn collect_results(
        &self,
        log: &dyn EventLog,
        run_id: u64,
    ) -> Result<Vec<PoolResult>, EventLogError> {
        let mut results = Vec::with_capacity(self.pools.len());
        for pool in &self.pools {
            let key_prefix = ticket_key_prefix(&pool.settings.id_prefix, run_id, &pool.name);
            let stats = stats_from_event_log(log, &key_prefix).await?;
            results.push(PoolResult {
                pool_name: pool.name.clone(),
                logs: pool.settings.logs.clone(),
                summary: PoolSummary::from_stats(&stats),
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    use super::{BenchmarkOrchestrator, PoolOutcome};
    use crate::config::{PoolDefinition, PoolSettings};
    use crate::event_log::InMemoryEventLog;
    use crate::events::{EventRecord, MatchEventType};
    use crate::service::{MatchmakingService, SimulatedBehavior, SimulatedMatchmakingService};

    fn pool(name: &str, total_players: usize) -> PoolDefinition {
        PoolDefinition::new(
            name,
            PoolSettings {
                total_players,
                id_prefix: "bench-".to_string(),
                game_modes: vec!["Classic".to_string(), "Practice".to_string()],
                player_attribute_distributions: json!({"skill": [900, 1100]})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                ..PoolSettings::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn pools_run_concurrently_and_report_in_order() {
        let service = Arc::new(SimulatedMatchmakingService::new(SimulatedBehavior {
            search_delay: Duration::from_secs(1),
            ..SimulatedBehavior::default()
        }));
        let orchestrator = BenchmarkOrchestrator::new(
            vec![pool("Classic1", 6), pool("Survival1", 4)],
            service,
        )
        .with_seed(9);

        let report = orchestrator.run(12).await;

        let names: Vec<_> = report.pools.iter().map(PoolOutcome::pool_name).collect();
        assert_eq!(names, vec!["Classic1", "Survival1"]);
        for outcome in &report.pools {
            match outcome {
                PoolOutcome::Finished(pool) => {
                    assert_eq!(pool.summary.completed, pool.batches);
                }
                PoolOutcome::Crashed { error, .. } => panic!("pool crashed: {error}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn player_ids_are_distinct_across_pools_of_one_run() {
        let service = Arc::new(SimulatedMatchmakingService::new(SimulatedBehavior {
            search_delay: Duration::from_secs(1),
            ..SimulatedBehavior::default()
        }));
        let orchestrator = BenchmarkOrchestrator::new(
            vec![pool("Classic1", 5), pool("Practice1", 5)],
            service.clone(),
        )
        .with_seed(4);

        orchestrator.run(13).await;

        let mut player_ids = Vec::new();
        for ticket_id in service.ticket_ids().await {
            let description = service.describe_ticket(&ticket_id).await.unwrap();
            player_ids.extend(description.player_ids);
        }
        let distinct: HashSet<&String> = player_ids.iter().collect();
        assert_eq!(player_ids.len(), 10);
        assert_eq!(distinct.len(), 10);
        assert!(player_ids
            .iter()
            .all(|id| id.starts_with("player-bench-13-Classic1-")
                || id.starts_with("player-bench-13-Practice1-")));
    }

    #[test]
    fn sample_draws_players_for_every_pool() {
        let service = Arc::new(SimulatedMatchmakingService::new(SimulatedBehavior::default()));
        let orchestrator =
            BenchmarkOrchestrator::new(vec![pool("AllModes", 10), pool("Classic1", 10)], service);
        let mut rng = StdRng::seed_from_u64(1);

        let sampled = orchestrator.sample(3, &mut rng);

        assert_eq!(sampled.len(), 6);
        assert!(sampled[..3].iter().all(|entry| entry.pool_name == "AllModes"));
        assert!(sampled[3..]
            .iter()
            .all(|entry| entry.game_modes == vec!["Classic".to_string()]));
        let skill = sampled[0].player.attribute("skill").unwrap();
        assert!(skill == 900.0 || skill == 1100.0);
    }

    #[tokio::test]
    async fn results_are_collected_per_pool_prefix() {
        let service = Arc::new(SimulatedMatchmakingService::new(SimulatedBehavior::default()));
        let orchestrator =
            BenchmarkOrchestrator::new(vec![pool("Classic1", 4), pool("Practice1", 4)], service);
        let log = InMemoryEventLog::new();
        log.append([
            EventRecord::new("bench-5-Classic1-aaaa", MatchEventType::MatchmakingSucceeded, 4.0),
            EventRecord::new("bench-5-Classic1-bbbb", MatchEventType::MatchmakingSucceeded, 8.0),
            EventRecord::new("bench-5-Practice1-cccc", MatchEventType::MatchmakingFailed, 3.0),
        ])
        .await;

        let results = orchestrator.collect_results(&log, 5).await.unwrap();

        assert_eq!(results[0].summary.completed, 2);
        assert_eq!(results[0].summary.completed_avg_secs, 6.0);
        assert_eq!(results[1].summary.failed, 1);
        assert_eq!(results[1].summary.completed, 0);
    }
}

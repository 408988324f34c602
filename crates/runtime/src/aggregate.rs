use std::collections::HashMap;

use crate::event_log::{EventLog, EventLogError};
use crate::events::MatchEventType;
use crate::metrics::{ElapsedPercentiles, PoolRunStats};
use crate::ticket::TicketOutcome;

pub fn average_secs(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolSummary {
    pub completed: usize,
    pub completed_avg_secs: f64,
    pub failed: usize,
    pub failed_avg_secs: f64,
    pub percentiles: Option<ElapsedPercentiles>,
    pub unresolved: usize,
}

impl PoolSummary {
    pub fn from_stats(stats: &PoolRunStats) -> Self {
        Self {
            completed: stats.completed(),
            completed_avg_secs: average_secs(stats.completed_secs()),
            failed: stats.failed(),
            failed_avg_secs: average_secs(stats.failed_secs()),
            percentiles: stats.completed_percentiles(),
            unresolved: stats.unresolved(),
        }
    }
}

/// Builds run stats from the event log with one success query and one
/// failure query. A ticket that appears in both counts as completed, and
/// repeated records for one ticket count once.
pub async fn stats_from_event_log(
    log: &dyn EventLog,
    key_prefix: &str,
) -> Result<PoolRunStats, EventLogError> {
    let succeeded = log.query(key_prefix, &MatchEventType::SUCCESS).await?;
    let failed = log.query(key_prefix, &MatchEventType::FAILURES).await?;

    let mut outcomes: HashMap<String, (TicketOutcome, f64)> = HashMap::new();
    for record in failed {
        outcomes
            .entry(record.ticket_id)
            .or_insert((TicketOutcome::Failed, record.elapsed_secs));
    }
    for record in succeeded {
        outcomes.insert(record.ticket_id, (TicketOutcome::Completed, record.elapsed_secs));
    }

    let mut ordered: Vec<_> = outcomes.into_iter().collect();
    ordered.sort_by(|left, right| left.0.cmp(&right.0));

    let mut stats = PoolRunStats::new();
    for (_, (outcome, elapsed_secs)) in ordered {
        stats.record(outcome, elapsed_secs);
    }
    Ok(stats)
}

use crate::ticket::TicketOutcome;

#[derive(Debug, Clone, PartialEq)]
pub struct ElapsedPercentiles {
    pub count: usize,
    pub p50_secs: f64,
    pub p95_secs: f64,
    pub max_secs: f64,
}

impl ElapsedPercentiles {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable_by(f64::total_cmp);
        let count = sorted.len();

        Some(Self {
            count,
            p50_secs: percentile_nearest_rank(&sorted, 50),
            p95_secs: percentile_nearest_rank(&sorted, 95),
            max_secs: sorted[count - 1],
        })
    }
}

fn percentile_nearest_rank(sorted: &[f64], percentile: usize) -> f64 {
    let count = sorted.len();
    let rank = (percentile * count).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}

/// Elapsed seconds of every resolved ticket in one pool run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoolRunStats {
    completed_secs: Vec<f64>,
    failed_secs: Vec<f64>,
    unresolved: usize,
}

impl PoolRunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TicketOutcome, elapsed_secs: f64) {
        match outcome {
            TicketOutcome::Completed => self.completed_secs.push(elapsed_secs),
            TicketOutcome::Failed => self.failed_secs.push(elapsed_secs),
        }
    }

    pub fn mark_unresolved(&mut self, count: usize) {
        self.unresolved += count;
    }

    pub fn completed_secs(&self) -> &[f64] {
        &self.completed_secs
    }

    pub fn failed_secs(&self) -> &[f64] {
        &self.failed_secs
    }

    pub fn completed(&self) -> usize {
        self.completed_secs.len()
    }

    pub fn failed(&self) -> usize {
        self.failed_secs.len()
    }

    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    pub fn completed_percentiles(&self) -> Option<ElapsedPercentiles> {
        ElapsedPercentiles::from_samples(&self.completed_secs)
    }
}

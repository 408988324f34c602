use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::service::{AcceptanceDecision, MatchmakingService, ServiceError};

const RESPONSE_DELAY_MIN_MS: u64 = 100;
const RESPONSE_DELAY_MAX_MS: u64 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptancePlan {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl AcceptancePlan {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.rejected.is_empty()
    }

    /// One rejecting player rejects the whole match.
    pub fn decision(&self) -> AcceptanceDecision {
        if self.rejected.is_empty() {
            AcceptanceDecision::Accept
        } else {
            AcceptanceDecision::Reject
        }
    }
}

#[derive(Debug)]
pub enum AcceptanceOutcome {
    Accepted { players: Vec<String> },
    Rejected { players: Vec<String> },
    Skipped,
    DecisionFailed {
        decision: AcceptanceDecision,
        error: ServiceError,
    },
}

impl AcceptanceOutcome {
    /// Only a fully accepted match counts as a successful episode. A skipped
    /// proposal had nobody to accept it.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Decides per player whether a proposed match is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceSimulator {
    rate: f64,
}

impl AcceptanceSimulator {
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn plan(&self, player_ids: &[String], rng: &mut impl Rng) -> AcceptancePlan {
        let mut plan = AcceptancePlan::default();
        for player_id in player_ids {
            if rng.gen::<f64>() < self.rate {
                plan.accepted.push(player_id.clone());
            } else {
                plan.rejected.push(player_id.clone());
            }
        }
        plan
    }

    pub fn response_delay(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.gen_range(RESPONSE_DELAY_MIN_MS..=RESPONSE_DELAY_MAX_MS))
    }

    /// Waits out the simulated response delay, then sends a single decision
    /// for the ticket. Rejections are sent for the rejecting players only.
    pub async fn resolve(
        &self,
        service: &dyn MatchmakingService,
        ticket_id: &str,
        plan: AcceptancePlan,
        delay: Duration,
    ) -> AcceptanceOutcome {
        if plan.is_empty() {
            return AcceptanceOutcome::Skipped;
        }
        sleep(delay).await;

        let decision = plan.decision();
        let players = match decision {
            AcceptanceDecision::Accept => plan.accepted,
            AcceptanceDecision::Reject => plan.rejected,
        };
        match service.accept_match(ticket_id, &players, decision).await {
            Ok(()) => match decision {
                AcceptanceDecision::Accept => AcceptanceOutcome::Accepted { players },
                AcceptanceDecision::Reject => AcceptanceOutcome::Rejected { players },
            },
            Err(error) => AcceptanceOutcome::DecisionFailed { decision, error },
        }
    }
}

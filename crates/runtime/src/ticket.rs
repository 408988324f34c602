use std::collections::BTreeMap;

use population::Player;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const TICKET_SUFFIX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Queued,
    Searching,
    RequiresAcceptance,
    Placing,
    Completed,
    Cancelled,
    Failed,
    TimedOut,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketOutcome {
    Completed,
    Failed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Searching => "SEARCHING",
            Self::RequiresAcceptance => "REQUIRES_ACCEPTANCE",
            Self::Placing => "PLACING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// `None` for every non-terminal status.
    pub fn outcome(self) -> Option<TicketOutcome> {
        match self {
            Self::Completed => Some(TicketOutcome::Completed),
            Self::Cancelled | Self::Failed | Self::TimedOut => Some(TicketOutcome::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.outcome().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDescription {
    pub ticket_id: String,
    pub pool_name: String,
    pub status: TicketStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub player_ids: Vec<String>,
}

impl TicketDescription {
    /// Falls back to `observed_at` when the service reports a terminal status
    /// without an end time.
    pub fn elapsed_secs(&self, observed_at: OffsetDateTime) -> f64 {
        let end = self.end_time.unwrap_or(observed_at);
        (end - self.start_time).as_seconds_f64().max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub player_id: String,
    pub attributes: BTreeMap<String, f64>,
    pub game_modes: Vec<String>,
    pub latency_in_ms: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub ticket_id: String,
    pub pool_name: String,
    pub players: Vec<PlayerEntry>,
}

impl TicketRequest {
    pub fn new(
        ticket_id: impl Into<String>,
        pool_name: impl Into<String>,
        batch: &[Player],
        game_modes: &[String],
    ) -> Self {
        let players = batch
            .iter()
            .map(|player| PlayerEntry {
                player_id: player.player_id.clone(),
                attributes: player.attributes.clone(),
                game_modes: game_modes.to_vec(),
                latency_in_ms: player.latency_ms.clone(),
            })
            .collect();

        Self {
            ticket_id: ticket_id.into(),
            pool_name: pool_name.into(),
            players,
        }
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|player| player.player_id.clone())
            .collect()
    }
}

/// Every ticket of one pool in one run starts with this prefix, which is also
/// the key used to scope event-log queries.
pub fn ticket_key_prefix(id_prefix: &str, run_id: u64, pool_name: &str) -> String {
    format!("{id_prefix}{run_id}-{pool_name}-")
}

pub fn generate_ticket_id(key_prefix: &str, rng: &mut impl Rng) -> String {
    let suffix: String = (0..TICKET_SUFFIX_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    format!("{key_prefix}{suffix}")
}

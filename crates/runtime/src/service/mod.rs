mod http;
mod simulated;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ticket::{TicketDescription, TicketRequest};

pub use http::HttpMatchmakingService;
pub use simulated::{RecordedDecision, SimulatedBehavior, SimulatedMatchmakingService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceDecision {
    Accept,
    Reject,
}

impl AcceptanceDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

#[derive(Debug)]
pub enum ServiceError {
    Transport(reqwest::Error),
    Api { status: u16, body: String },
    Decode(String),
    UnknownTicket(String),
    Rejected(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "matchmaking service request failed: {err}"),
            Self::Api { status, body } => {
                write!(f, "matchmaking service returned {status}: {body}")
            }
            Self::Decode(msg) => write!(f, "matchmaking service response was malformed: {msg}"),
            Self::UnknownTicket(ticket_id) => write!(f, "unknown ticket {ticket_id}"),
            Self::Rejected(msg) => write!(f, "matchmaking service rejected the call: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// The external matchmaking service the benchmark drives.
#[async_trait]
pub trait MatchmakingService: Send + Sync {
    async fn start_matchmaking(&self, request: &TicketRequest) -> Result<String, ServiceError>;

    async fn describe_ticket(&self, ticket_id: &str) -> Result<TicketDescription, ServiceError>;

    async fn accept_match(
        &self,
        ticket_id: &str,
        player_ids: &[String],
        decision: AcceptanceDecision,
    ) -> Result<(), ServiceError>;
}

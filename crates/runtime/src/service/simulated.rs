use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::{AcceptanceDecision, MatchmakingService, ServiceError};
use crate::event_log::InMemoryEventLog;
use crate::events::{EventRecord, MatchEventType};
use crate::ticket::{TicketDescription, TicketRequest, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedBehavior {
    pub search_delay: Duration,
    pub acceptance_required: bool,
    pub acceptance_timeout: Duration,
    /// Submissions beyond this count fail with a throttling error.
    pub max_submissions: Option<usize>,
}

impl Default for SimulatedBehavior {
    fn default() -> Self {
        Self {
            search_delay: Duration::from_secs(5),
            acceptance_required: false,
            acceptance_timeout: Duration::from_secs(10),
            max_submissions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDecision {
    pub ticket_id: String,
    pub player_ids: Vec<String>,
    pub decision: AcceptanceDecision,
}

#[derive(Debug)]
struct SimulatedTicket {
    pool_name: String,
    player_ids: Vec<String>,
    status: TicketStatus,
    start_time: OffsetDateTime,
    started: Instant,
    end_time: Option<OffsetDateTime>,
}

impl SimulatedTicket {
    // Wall time derived from the tokio clock so paused-time tests stay consistent.
    fn now(&self) -> OffsetDateTime {
        self.start_time + self.started.elapsed()
    }

    fn settle(&mut self, ticket_id: &str, status: TicketStatus) -> Option<EventRecord> {
        let end_time = self.now();
        self.status = status;
        self.end_time = Some(end_time);

        let event_type = match status {
            TicketStatus::Completed => MatchEventType::MatchmakingSucceeded,
            TicketStatus::Cancelled => MatchEventType::MatchmakingCancelled,
            TicketStatus::TimedOut => MatchEventType::MatchmakingTimedOut,
            TicketStatus::Failed => MatchEventType::MatchmakingFailed,
            _ => return None,
        };
        let elapsed = (end_time - self.start_time).as_seconds_f64();
        Some(EventRecord::new(ticket_id, event_type, elapsed))
    }

    fn describe(&self, ticket_id: &str) -> TicketDescription {
        TicketDescription {
            ticket_id: ticket_id.to_string(),
            pool_name: self.pool_name.clone(),
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            player_ids: self.player_ids.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct SimulatedState {
    tickets: HashMap<String, SimulatedTicket>,
    decisions: Vec<RecordedDecision>,
    submissions: usize,
}

/// In-process stand-in for the matchmaking service. Tickets move from
/// SEARCHING to COMPLETED (or through REQUIRES_ACCEPTANCE) on the tokio clock.
#[derive(Debug, Clone)]
pub struct SimulatedMatchmakingService {
    behavior: SimulatedBehavior,
    state: Arc<Mutex<SimulatedState>>,
    event_sink: Option<Arc<InMemoryEventLog>>,
}

impl SimulatedMatchmakingService {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        Self {
            behavior,
            state: Arc::new(Mutex::new(SimulatedState::default())),
            event_sink: None,
        }
    }

    /// Terminal transitions are also published here, the way the real
    /// service's notification pipeline fills the event log.
    pub fn with_event_sink(mut self, sink: Arc<InMemoryEventLog>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub async fn decisions(&self) -> Vec<RecordedDecision> {
        self.state.lock().await.decisions.clone()
    }

    pub async fn submissions(&self) -> usize {
        self.state.lock().await.submissions
    }

    pub async fn ticket_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().await.tickets.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn progress(self, ticket_id: String) {
        sleep(self.behavior.search_delay).await;
        let record = {
            let mut state = self.state.lock().await;
            let Some(ticket) = state.tickets.get_mut(&ticket_id) else {
                return;
            };
            if ticket.status != TicketStatus::Searching {
                return;
            }
            if self.behavior.acceptance_required {
                ticket.status = TicketStatus::RequiresAcceptance;
                None
            } else {
                ticket.settle(&ticket_id, TicketStatus::Completed)
            }
        };
        if record.is_some() {
            self.publish(record).await;
            return;
        }

        sleep(self.behavior.acceptance_timeout).await;
        let record = {
            let mut state = self.state.lock().await;
            match state.tickets.get_mut(&ticket_id) {
                Some(ticket) if ticket.status == TicketStatus::RequiresAcceptance => {
                    ticket.settle(&ticket_id, TicketStatus::TimedOut)
                }
                _ => None,
            }
        };
        self.publish(record).await;
    }

    async fn publish(&self, record: Option<EventRecord>) {
        if let (Some(sink), Some(record)) = (&self.event_sink, record) {
            sink.append([record]).await;
        }
    }
}

#[async_trait]
impl MatchmakingService for SimulatedMatchmakingService {
    async fn start_matchmaking(&self, request: &TicketRequest) -> Result<String, ServiceError> {
        {
            let mut state = self.state.lock().await;
            if let Some(limit) = self.behavior.max_submissions {
                if state.submissions >= limit {
                    return Err(ServiceError::Api {
                        status: 503,
                        body: "submission rate exceeded".to_string(),
                    });
                }
            }
            state.submissions += 1;
            state.tickets.insert(
                request.ticket_id.clone(),
                SimulatedTicket {
                    pool_name: request.pool_name.clone(),
                    player_ids: request.player_ids(),
                    status: TicketStatus::Searching,
                    start_time: OffsetDateTime::now_utc(),
                    started: Instant::now(),
                    end_time: None,
                },
            );
        }

        tokio::spawn(self.clone().progress(request.ticket_id.clone()));
        Ok(request.ticket_id.clone())
    }

    async fn describe_ticket(&self, ticket_id: &str) -> Result<TicketDescription, ServiceError> {
        self.state
            .lock()
            .await
            .tickets
            .get(ticket_id)
            .map(|ticket| ticket.describe(ticket_id))
            .ok_or_else(|| ServiceError::UnknownTicket(ticket_id.to_string()))
    }

    async fn accept_match(
        &self,
        ticket_id: &str,
        player_ids: &[String],
        decision: AcceptanceDecision,
    ) -> Result<(), ServiceError> {
        let record = {
            let mut state = self.state.lock().await;
            state.decisions.push(RecordedDecision {
                ticket_id: ticket_id.to_string(),
                player_ids: player_ids.to_vec(),
                decision,
            });
            let ticket = state
                .tickets
                .get_mut(ticket_id)
                .ok_or_else(|| ServiceError::UnknownTicket(ticket_id.to_string()))?;
            if ticket.status != TicketStatus::RequiresAcceptance {
                return Err(ServiceError::Rejected(format!(
                    "ticket {ticket_id} is {}",
                    ticket.status.as_str()
                )));
            }
            let status = match decision {
                AcceptanceDecision::Accept => TicketStatus::Completed,
                AcceptanceDecision::Reject => TicketStatus::Cancelled,
            };
            ticket.settle(ticket_id, status)
        };
        self.publish(record).await;
        Ok(())
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTicket {
    pub ticket_id: String,
    pub submitted_at: Instant,
}

/// Tickets submitted for one pool that have not reached a terminal outcome.
/// Shared between the submitting driver and the monitor.
#[derive(Debug, Default)]
pub struct TicketRegistry {
    active: Mutex<Vec<ActiveTicket>>,
    submitted: AtomicUsize,
    submission_finished: AtomicBool,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, ticket_id: impl Into<String>) {
        self.active.lock().await.push(ActiveTicket {
            ticket_id: ticket_id.into(),
            submitted_at: Instant::now(),
        });
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns false when the ticket was already removed, so callers can
    /// count each outcome exactly once.
    pub async fn remove(&self, ticket_id: &str) -> bool {
        let mut active = self.active.lock().await;
        match active.iter().position(|ticket| ticket.ticket_id == ticket_id) {
            Some(index) => {
                active.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub async fn contains(&self, ticket_id: &str) -> bool {
        self.active
            .lock()
            .await
            .iter()
            .any(|ticket| ticket.ticket_id == ticket_id)
    }

    pub async fn active_ids(&self) -> Vec<String> {
        self.active
            .lock()
            .await
            .iter()
            .map(|ticket| ticket.ticket_id.clone())
            .collect()
    }

    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn finish_submission(&self) {
        self.submission_finished.store(true, Ordering::SeqCst);
    }

    pub fn is_submission_finished(&self) -> bool {
        self.submission_finished.load(Ordering::SeqCst)
    }

    /// Monitoring may stop once nothing more will be submitted and every
    /// submitted ticket has been resolved.
    pub async fn is_drained(&self) -> bool {
        self.is_submission_finished() && self.active.lock().await.is_empty()
    }
}

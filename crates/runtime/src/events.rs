use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchEventType {
    MatchmakingSucceeded,
    AcceptMatchCompleted,
    MatchmakingFailed,
    MatchmakingCancelled,
    MatchmakingTimedOut,
}

impl MatchEventType {
    pub const SUCCESS: [Self; 1] = [Self::MatchmakingSucceeded];
    pub const FAILURES: [Self; 3] = [
        Self::MatchmakingFailed,
        Self::MatchmakingCancelled,
        Self::MatchmakingTimedOut,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MatchmakingSucceeded" => Some(Self::MatchmakingSucceeded),
            "AcceptMatchCompleted" => Some(Self::AcceptMatchCompleted),
            "MatchmakingFailed" => Some(Self::MatchmakingFailed),
            "MatchmakingCancelled" => Some(Self::MatchmakingCancelled),
            "MatchmakingTimedOut" => Some(Self::MatchmakingTimedOut),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatchmakingSucceeded => "MatchmakingSucceeded",
            Self::AcceptMatchCompleted => "AcceptMatchCompleted",
            Self::MatchmakingFailed => "MatchmakingFailed",
            Self::MatchmakingCancelled => "MatchmakingCancelled",
            Self::MatchmakingTimedOut => "MatchmakingTimedOut",
        }
    }
}

/// One persisted ticket event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub ticket_id: String,
    pub event_type: MatchEventType,
    pub elapsed_secs: f64,
}

impl EventRecord {
    pub fn new(ticket_id: impl Into<String>, event_type: MatchEventType, elapsed_secs: f64) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            event_type,
            elapsed_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNotificationError {
    InvalidJson,
    MissingMessage,
    InvalidEventTime,
    InvalidTicketStartTime(String),
}

impl fmt::Display for ParseNotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "notification is not valid JSON"),
            Self::MissingMessage => write!(f, "notification envelope has no message"),
            Self::InvalidEventTime => write!(f, "notification time is not RFC 3339"),
            Self::InvalidTicketStartTime(ticket_id) => {
                write!(f, "ticket {ticket_id} has a start time that is not RFC 3339")
            }
        }
    }
}

impl std::error::Error for ParseNotificationError {}

#[derive(Debug, Deserialize)]
struct Notification {
    time: String,
    detail: NotificationDetail,
}

#[derive(Debug, Deserialize)]
struct NotificationDetail {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    tickets: Vec<NotificationTicket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationTicket {
    ticket_id: String,
    start_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    records: Vec<EnvelopeRecord>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRecord {
    #[serde(rename = "Sns")]
    sns: EnvelopeMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvelopeMessage {
    message: String,
}

/// Turns one matchmaking event notification into event records, one per
/// ticket. Accepts the bare event or a topic delivery envelope wrapping it.
/// Event types that carry no outcome yield no records.
pub fn records_from_notification(raw: &str) -> Result<Vec<EventRecord>, ParseNotificationError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| ParseNotificationError::InvalidJson)?;

    let notification: Notification = if value.get("Records").is_some() {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|_| ParseNotificationError::InvalidJson)?;
        let message = envelope
            .records
            .into_iter()
            .next()
            .ok_or(ParseNotificationError::MissingMessage)?
            .sns
            .message;
        serde_json::from_str(&message).map_err(|_| ParseNotificationError::InvalidJson)?
    } else {
        serde_json::from_value(value).map_err(|_| ParseNotificationError::InvalidJson)?
    };

    let Some(event_type) = MatchEventType::parse(&notification.detail.kind) else {
        return Ok(Vec::new());
    };

    let event_time = OffsetDateTime::parse(&notification.time, &Rfc3339)
        .map_err(|_| ParseNotificationError::InvalidEventTime)?;

    notification
        .detail
        .tickets
        .into_iter()
        .map(|ticket| {
            let start = OffsetDateTime::parse(&ticket.start_time, &Rfc3339).map_err(|_| {
                ParseNotificationError::InvalidTicketStartTime(ticket.ticket_id.clone())
            })?;
            let elapsed = (event_time - start).as_seconds_f64();
            Ok(EventRecord::new(ticket.ticket_id, event_type, elapsed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{records_from_notification, EventRecord, MatchEventType, ParseNotificationError};

    fn succeeded_notification() -> serde_json::Value {
        json!({
            "time": "2026-02-01T12:00:30.000Z",
            "detail": {
                "type": "MatchmakingSucceeded",
                "tickets": [
                    {"ticketId": "bench-3-Classic1-aaaa", "startTime": "2026-02-01T12:00:00.000Z"},
                    {"ticketId": "bench-3-Classic1-bbbb", "startTime": "2026-02-01T12:00:20.500Z"},
                ],
                "customEventData": "Classic1-events",
            }
        })
    }

    #[test]
    fn builds_one_record_per_ticket_with_elapsed_seconds() {
        let records = records_from_notification(&succeeded_notification().to_string()).unwrap();

        assert_eq!(
            records,
            vec![
                EventRecord::new("bench-3-Classic1-aaaa", MatchEventType::MatchmakingSucceeded, 30.0),
                EventRecord::new("bench-3-Classic1-bbbb", MatchEventType::MatchmakingSucceeded, 9.5),
            ]
        );
    }

    #[test]
    fn unwraps_topic_delivery_envelope() {
        let envelope = json!({
            "Records": [{"Sns": {"Message": succeeded_notification().to_string()}}]
        });

        let records = records_from_notification(&envelope.to_string()).unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn ignores_event_types_without_outcome() {
        let raw = json!({
            "time": "2026-02-01T12:00:30.000Z",
            "detail": {"type": "PotentialMatchCreated", "tickets": []}
        });

        assert!(records_from_notification(&raw.to_string()).unwrap().is_empty());
    }

    #[test]
    fn reports_bad_timestamps() {
        let raw = json!({
            "time": "2026-02-01T12:00:30.000Z",
            "detail": {
                "type": "MatchmakingTimedOut",
                "tickets": [{"ticketId": "t-1", "startTime": "yesterday"}]
            }
        });

        assert_eq!(
            records_from_notification(&raw.to_string()),
            Err(ParseNotificationError::InvalidTicketStartTime("t-1".to_string()))
        );
        assert_eq!(
            records_from_notification("not json"),
            Err(ParseNotificationError::InvalidJson)
        );
    }

    #[test]
    fn event_record_serializes_with_camel_case_keys() {
        let record = EventRecord::new("t-1", MatchEventType::MatchmakingFailed, 4.25);

        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({"ticketId": "t-1", "eventType": "MatchmakingFailed", "elapsedSecs": 4.25})
        );
    }
}

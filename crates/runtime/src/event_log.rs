use std::{fmt, io, path::PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::events::{EventRecord, MatchEventType};

#[derive(Debug)]
pub enum EventLogError {
    Io(io::Error),
    Decode { line: usize, source: serde_json::Error },
    Encode(serde_json::Error),
}

impl fmt::Display for EventLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "event log I/O failed: {err}"),
            Self::Decode { line, source } => {
                write!(f, "event log line {line} is not a valid record: {source}")
            }
            Self::Encode(err) => write!(f, "event record could not be encoded: {err}"),
        }
    }
}

impl std::error::Error for EventLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

/// Persisted ticket events, queried by ticket-id prefix.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn query(
        &self,
        key_prefix: &str,
        event_types: &[MatchEventType],
    ) -> Result<Vec<EventRecord>, EventLogError>;
}

fn matches(record: &EventRecord, key_prefix: &str, event_types: &[MatchEventType]) -> bool {
    record.ticket_id.starts_with(key_prefix) && event_types.contains(&record.event_type)
}

#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, records: impl IntoIterator<Item = EventRecord>) {
        self.records.lock().await.extend(records);
    }

    pub async fn records(&self) -> Vec<EventRecord> {
        self.records.lock().await.clone()
    }

    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn query(
        &self,
        key_prefix: &str,
        event_types: &[MatchEventType],
    ) -> Result<Vec<EventRecord>, EventLogError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| matches(record, key_prefix, event_types))
            .cloned()
            .collect())
    }
}

/// One JSON record per line. A missing file reads as an empty log.
#[derive(Debug)]
pub struct JsonlEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, records: &[EventRecord]) -> Result<(), EventLogError> {
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record).map_err(EventLogError::Encode)?;
            buffer.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(EventLogError::Io)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(EventLogError::Io)?;
        file.write_all(&buffer).await.map_err(EventLogError::Io)?;
        file.flush().await.map_err(EventLogError::Io)
    }
}

#[async_trait]
impl EventLog for JsonlEventLog {
    async fn query(
        &self,
        key_prefix: &str,
        event_types: &[MatchEventType],
    ) -> Result<Vec<EventRecord>, EventLogError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(EventLogError::Io(err)),
        };

        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: EventRecord =
                serde_json::from_str(line).map_err(|source| EventLogError::Decode {
                    line: index + 1,
                    source,
                })?;
            if matches(&record, key_prefix, event_types) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{EventLog, EventLogError, InMemoryEventLog, JsonlEventLog};
    use crate::events::{EventRecord, MatchEventType};

    fn sample_records() -> Vec<EventRecord> {
        vec![
            EventRecord::new("bench-2-Classic1-a", MatchEventType::MatchmakingSucceeded, 3.0),
            EventRecord::new("bench-2-Classic1-b", MatchEventType::MatchmakingTimedOut, 9.0),
            EventRecord::new("bench-1-Classic1-c", MatchEventType::MatchmakingSucceeded, 1.0),
            EventRecord::new("bench-2-Survival1-d", MatchEventType::MatchmakingSucceeded, 2.0),
        ]
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("event-log-{name}-{unique}"))
            .join("events.jsonl")
    }

    #[tokio::test]
    async fn in_memory_log_filters_by_prefix_and_type() {
        let log = InMemoryEventLog::new();
        log.append(sample_records()).await;

        let succeeded = log
            .query("bench-2-Classic1-", &MatchEventType::SUCCESS)
            .await
            .unwrap();
        let failed = log
            .query("bench-2-Classic1-", &MatchEventType::FAILURES)
            .await
            .unwrap();

        assert_eq!(succeeded.len(), 1);
        assert_eq!(succeeded[0].ticket_id, "bench-2-Classic1-a");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].event_type, MatchEventType::MatchmakingTimedOut);
    }

    #[tokio::test]
    async fn jsonl_log_round_trips_appended_records() {
        let path = temp_path("round-trip");
        let log = JsonlEventLog::new(&path);

        let records = sample_records();
        log.append(&records[..2]).await.unwrap();
        log.append(&records[2..]).await.unwrap();

        let succeeded = log
            .query("bench-2-", &MatchEventType::SUCCESS)
            .await
            .unwrap();
        assert_eq!(succeeded.len(), 2);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let log = JsonlEventLog::new(temp_path("missing"));

        let records = log.query("", &MatchEventType::SUCCESS).await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn corrupt_line_reports_its_line_number() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "{\"ticketId\":\"a\",\"eventType\":\"MatchmakingFailed\",\"elapsedSecs\":1.0}\nnope\n",
        )
        .unwrap();
        let log = JsonlEventLog::new(&path);

        let err = log.query("", &MatchEventType::FAILURES).await.unwrap_err();

        assert!(matches!(err, EventLogError::Decode { line: 2, .. }));
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}

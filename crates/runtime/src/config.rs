use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_LOGS: &str = "benchmark.log";
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 3;
const DEFAULT_EVENT_LOG_WAIT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    #[default]
    Polling,
    Event,
}

impl NotificationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "polling" => Some(Self::Polling),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Event => "event",
        }
    }
}

/// Per-pool benchmark settings as they appear in the benchmark file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    pub total_players: usize,
    pub team_size_default: usize,
    pub team_size_small: usize,
    pub acceptance_rate: f64,
    pub acceptance_timeout_seconds: u64,
    #[serde(default)]
    pub game_modes: Vec<String>,
    #[serde(default)]
    pub player_attribute_distributions: Map<String, Value>,
    #[serde(default)]
    pub id_prefix: String,
    #[serde(default)]
    pub notification_mode: NotificationMode,
    #[serde(default = "default_logs")]
    pub logs: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_event_log_wait_seconds")]
    pub event_log_wait_seconds: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            total_players: 10,
            team_size_default: 4,
            team_size_small: 2,
            acceptance_rate: 0.9,
            acceptance_timeout_seconds: 10,
            game_modes: Vec::new(),
            player_attribute_distributions: Map::new(),
            id_prefix: String::new(),
            notification_mode: NotificationMode::Polling,
            logs: default_logs(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            event_log_wait_seconds: DEFAULT_EVENT_LOG_WAIT_SECONDS,
        }
    }
}

impl PoolSettings {
    pub fn validate(&self) -> Result<(), PoolConfigError> {
        if self.total_players == 0 {
            return Err(PoolConfigError::InvalidTotalPlayers);
        }
        if self.team_size_default == 0 || self.team_size_small == 0 {
            return Err(PoolConfigError::InvalidTeamSize);
        }
        if !self.acceptance_rate.is_finite() || !(0.0..=1.0).contains(&self.acceptance_rate) {
            return Err(PoolConfigError::InvalidAcceptanceRate);
        }
        if self.poll_interval_seconds == 0 {
            return Err(PoolConfigError::InvalidPollInterval);
        }
        if self.logs.trim().is_empty() {
            return Err(PoolConfigError::InvalidLogs);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn acceptance_timeout(&self) -> Duration {
        Duration::from_secs(self.acceptance_timeout_seconds)
    }

    pub fn event_log_wait(&self) -> Duration {
        Duration::from_secs(self.event_log_wait_seconds)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolDefinition {
    pub name: String,
    pub settings: PoolSettings,
}

impl PoolDefinition {
    pub fn new(name: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolConfigError {
    InvalidTotalPlayers,
    InvalidTeamSize,
    InvalidAcceptanceRate,
    InvalidPollInterval,
    InvalidLogs,
}

impl fmt::Display for PoolConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTotalPlayers => write!(f, "totalPlayers must be greater than 0"),
            Self::InvalidTeamSize => {
                write!(f, "teamSizeDefault and teamSizeSmall must be greater than 0")
            }
            Self::InvalidAcceptanceRate => {
                write!(f, "acceptanceRate must be a finite number between 0 and 1")
            }
            Self::InvalidPollInterval => write!(f, "pollIntervalSeconds must be greater than 0"),
            Self::InvalidLogs => write!(f, "logs must not be empty or whitespace"),
        }
    }
}

impl std::error::Error for PoolConfigError {}

fn default_logs() -> String {
    DEFAULT_LOGS.to_owned()
}

fn default_poll_interval_seconds() -> u64 {
    DEFAULT_POLL_INTERVAL_SECONDS
}

fn default_event_log_wait_seconds() -> u64 {
    DEFAULT_EVENT_LOG_WAIT_SECONDS
}

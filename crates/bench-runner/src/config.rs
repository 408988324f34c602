use std::{env, fmt};

use runtime::service::ServiceError;

const DEFAULT_MODE: RunMode = RunMode::Benchmark;
const DEFAULT_CONFIG_PATH: &str = "Configs/config.json";
const DEFAULT_RUN_ID_PATH: &str = "artifacts/benchmark-id";
const DEFAULT_SERVICE: ServiceKind = ServiceKind::Simulated;
const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_EVENT_LOG_PATH: &str = "artifacts/events.jsonl";
const DEFAULT_SAMPLE_SIZE: usize = 1;

const ENV_MODE_KEY: &str = "BENCH_MODE";
const ENV_CONFIG_PATH_KEY: &str = "BENCH_CONFIG_PATH";
const ENV_RUN_ID_PATH_KEY: &str = "BENCH_RUN_ID_PATH";
const ENV_SERVICE_KEY: &str = "BENCH_SERVICE";
const ENV_SERVICE_URL_KEY: &str = "BENCH_SERVICE_URL";
const ENV_EVENT_LOG_PATH_KEY: &str = "BENCH_EVENT_LOG_PATH";
const ENV_SAMPLE_SIZE_KEY: &str = "BENCH_SAMPLE_SIZE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Benchmark,
    Sample,
    Result,
    Ingest,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "benchmark" => Some(Self::Benchmark),
            "sample" => Some(Self::Sample),
            "result" => Some(Self::Result),
            "ingest" => Some(Self::Ingest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Benchmark => "benchmark",
            Self::Sample => "sample",
            Self::Result => "result",
            Self::Ingest => "ingest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Simulated,
    Http,
}

impl ServiceKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "simulated" => Some(Self::Simulated),
            "http" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Http => "http",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RunMode,
    pub config_path: String,
    pub run_id_path: String,
    pub service: ServiceKind,
    pub service_url: String,
    pub event_log_path: String,
    pub sample_size: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMode,
    InvalidService,
    InvalidServiceUrl,
    InvalidSampleSize,
    EmptyPath(&'static str),
    NonUnicode(&'static str),
    ServiceSetup(ServiceError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode => {
                write!(f, "{ENV_MODE_KEY} must be one of: benchmark, sample, result, ingest")
            }
            Self::InvalidService => {
                write!(f, "{ENV_SERVICE_KEY} must be one of: simulated, http")
            }
            Self::InvalidServiceUrl => {
                write!(f, "{ENV_SERVICE_URL_KEY} must start with http:// or https://")
            }
            Self::InvalidSampleSize => {
                write!(f, "{ENV_SAMPLE_SIZE_KEY} must be a whole number greater than 0")
            }
            Self::EmptyPath(key) => write!(f, "{key} must not be empty or whitespace"),
            Self::NonUnicode(key) => write!(f, "{key} contains non-unicode data"),
            Self::ServiceSetup(err) => write!(f, "matchmaking client setup failed: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ServiceSetup(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match read_env(ENV_MODE_KEY)? {
            Some(value) => RunMode::parse(value.as_str()).ok_or(ConfigError::InvalidMode)?,
            None => DEFAULT_MODE,
        };

        let service = match read_env(ENV_SERVICE_KEY)? {
            Some(value) => ServiceKind::parse(value.as_str()).ok_or(ConfigError::InvalidService)?,
            None => DEFAULT_SERVICE,
        };

        let service_url = match read_env(ENV_SERVICE_URL_KEY)? {
            Some(value) => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ConfigError::InvalidServiceUrl);
                }
                value
            }
            None => DEFAULT_SERVICE_URL.to_owned(),
        };

        let sample_size = match read_env(ENV_SAMPLE_SIZE_KEY)? {
            Some(value) => match value.parse::<usize>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => return Err(ConfigError::InvalidSampleSize),
            },
            None => DEFAULT_SAMPLE_SIZE,
        };

        Ok(Self {
            mode,
            config_path: read_path_env(ENV_CONFIG_PATH_KEY, DEFAULT_CONFIG_PATH)?,
            run_id_path: read_path_env(ENV_RUN_ID_PATH_KEY, DEFAULT_RUN_ID_PATH)?,
            service,
            service_url,
            event_log_path: read_path_env(ENV_EVENT_LOG_PATH_KEY, DEFAULT_EVENT_LOG_PATH)?,
            sample_size,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn read_path_env(key: &'static str, default_value: &str) -> Result<String, ConfigError> {
    match read_env(key)? {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyPath(key)),
        Some(value) => Ok(value),
        None => Ok(default_value.to_owned()),
    }
}

use std::{fmt, fs, io, path::Path};

use runtime::{PoolConfigError, PoolDefinition, PoolSettings};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BenchmarkFile {
    pools: Vec<PoolEntry>,
    #[serde(default)]
    benchmark: Option<PoolSettings>,
}

#[derive(Debug, Deserialize)]
struct PoolEntry {
    name: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    settings: Option<PoolSettings>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug)]
pub enum BenchmarkFileError {
    Io(io::Error),
    Parse(serde_json::Error),
    MissingSettings(String),
    InvalidPool {
        pool: String,
        source: PoolConfigError,
    },
}

impl fmt::Display for BenchmarkFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "benchmark file could not be read: {err}"),
            Self::Parse(err) => write!(f, "benchmark file is not valid: {err}"),
            Self::MissingSettings(pool) => write!(
                f,
                "pool {pool} has no settings and the file has no shared benchmark block"
            ),
            Self::InvalidPool { pool, source } => write!(f, "pool {pool}: {source}"),
        }
    }
}

impl std::error::Error for BenchmarkFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::MissingSettings(_) => None,
            Self::InvalidPool { source, .. } => Some(source),
        }
    }
}

/// Active pools of the benchmark file, each with its own settings or a copy
/// of the shared `benchmark` block.
pub fn parse_pools(content: &str) -> Result<Vec<PoolDefinition>, BenchmarkFileError> {
    let file: BenchmarkFile = serde_json::from_str(content).map_err(BenchmarkFileError::Parse)?;

    let mut pools = Vec::new();
    for entry in file.pools.into_iter().filter(|entry| entry.active) {
        let settings = match entry.settings.or_else(|| file.benchmark.clone()) {
            Some(settings) => settings,
            None => return Err(BenchmarkFileError::MissingSettings(entry.name)),
        };
        if let Err(source) = settings.validate() {
            return Err(BenchmarkFileError::InvalidPool {
                pool: entry.name,
                source,
            });
        }
        pools.push(PoolDefinition::new(entry.name, settings));
    }
    Ok(pools)
}

pub fn load_pools(path: impl AsRef<Path>) -> Result<Vec<PoolDefinition>, BenchmarkFileError> {
    let content = fs::read_to_string(path).map_err(BenchmarkFileError::Io)?;
    parse_pools(&content)
}

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum RunIdError {
    Io(io::Error),
    Corrupt(String),
    Overflow,
}

impl fmt::Display for RunIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "run id file error: {err}"),
            Self::Corrupt(content) => write!(f, "run id file holds `{content}`, not a number"),
            Self::Overflow => write!(f, "run id counter overflowed"),
        }
    }
}

impl std::error::Error for RunIdError {}

impl From<io::Error> for RunIdError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRun {
    pub id: u64,
    pub previous: Option<u64>,
}

/// Persistent benchmark run counter. Every run gets the stored value plus one
/// so ticket ids of different runs never share a prefix.
#[derive(Debug, Clone)]
pub struct RunIdStore {
    path: PathBuf,
}

impl RunIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_run(&self) -> Result<Option<u64>, RunIdError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let trimmed = content.trim();
        trimmed
            .parse::<u64>()
            .map(Some)
            .map_err(|_| RunIdError::Corrupt(trimmed.to_string()))
    }

    pub fn next_run(&self) -> Result<BenchmarkRun, RunIdError> {
        let previous = self.last_run()?;
        let id = match previous {
            Some(last) => last.checked_add(1).ok_or(RunIdError::Overflow)?,
            None => 1,
        };

        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, id.to_string())?;
        Ok(BenchmarkRun { id, previous })
    }
}

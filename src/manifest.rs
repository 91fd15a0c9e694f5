use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::domain::{LimitError, ProblemRecord};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no problem matches {query:?}")]
    ProblemNotFound { query: String },
    #[error("problem {problem_number} has an invalid {field} {value:?}")]
    InvalidLimit {
        problem_number: u32,
        field: &'static str,
        value: String,
    },
    #[error(transparent)]
    Limit(#[from] LimitError),
}

/// A limit as it appears in the manifest: either a bare number or text
/// such as `"1.00 s"` and `"512 MB"`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LimitValue {
    Number(f64),
    Text(String),
}

impl LimitValue {
    fn parse(&self, unit: &str) -> Option<f64> {
        match self {
            LimitValue::Number(value) => Some(*value),
            LimitValue::Text(text) => {
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                let number = compact
                    .strip_suffix(unit)
                    .or_else(|| compact.strip_suffix(&unit.to_ascii_lowercase()))
                    .unwrap_or(&compact);
                number.parse().ok()
            }
        }
    }
}

impl std::fmt::Display for LimitValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitValue::Number(value) => write!(f, "{}", value),
            LimitValue::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub problem_number: u32,
    pub title: String,
    pub time_limit: LimitValue,
    pub memory_limit: LimitValue,
}

impl ManifestEntry {
    pub fn problem_record(&self) -> Result<ProblemRecord, ManifestError> {
        let invalid = |field: &'static str, value: &LimitValue| ManifestError::InvalidLimit {
            problem_number: self.problem_number,
            field,
            value: value.to_string(),
        };

        let time_limit_s = self
            .time_limit
            .parse("s")
            .ok_or_else(|| invalid("time limit", &self.time_limit))?;
        let memory_limit_mb = self
            .memory_limit
            .parse("MB")
            .ok_or_else(|| invalid("memory limit", &self.memory_limit))?;

        Ok(ProblemRecord::new(
            self.problem_number,
            time_limit_s,
            memory_limit_mb,
        )?)
    }
}

/// The list of known problems, in the order the problem set presents them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.into(),
            source,
        })?;
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
                path: path.into(),
                source,
            })?;
        tracing::debug!("Loaded {} manifest entries", entries.len());
        Ok(Self { entries })
    }

    /// Looks a problem up by list position (1-based), problem number or
    /// title. Positions win over problem numbers when both could match.
    pub fn find(&self, query: &str) -> Result<&ManifestEntry, ManifestError> {
        let query = query.trim();
        let found = match query.parse::<usize>() {
            Ok(position) if (1..=self.entries.len()).contains(&position) => {
                self.entries.get(position - 1)
            }
            Ok(number) => self
                .entries
                .iter()
                .find(|entry| entry.problem_number as usize == number),
            Err(_) => {
                let wanted = query.replace('_', " ").to_lowercase();
                self.entries
                    .iter()
                    .find(|entry| entry.title.trim().to_lowercase() == wanted)
            }
        };

        found.ok_or_else(|| ManifestError::ProblemNotFound {
            query: query.to_string(),
        })
    }
}

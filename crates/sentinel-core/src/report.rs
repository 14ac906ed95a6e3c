use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A degraded-but-recovered condition noticed during reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Outcome of one pipeline (one chart or one feed) within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn weeks(weeks: usize, warnings: Vec<Warning>) -> Self {
        Self {
            status: Status::Ok,
            weeks: Some(weeks),
            rows: None,
            warnings,
            error: None,
        }
    }

    pub fn rows(rows: usize) -> Self {
        Self {
            status: Status::Ok,
            weeks: None,
            rows: Some(rows),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            weeks: None,
            rows: None,
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

/// Contents of `metadata.json` written after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub last_updated: String,
    pub sources: BTreeMap<String, BTreeMap<String, SourceStatus>>,
}

impl RunMetadata {
    pub fn has_errors(&self) -> bool {
        self.sources
            .values()
            .flat_map(|group| group.values())
            .any(SourceStatus::is_error)
    }
}

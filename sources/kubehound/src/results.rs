use crate::inputs::NodeInputs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ReportMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CheckStatus {
    /// Successfully verified to be in the expected state.
    PASS,
    /// Found to not be in the expected state.
    FAIL,
    /// Not applicable, or left to manual verification.
    #[default]
    SKIP,
    /// Could not be verified: inputs missing, source unreachable or unreadable.
    ERROR,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Automatic,
    Manual,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// CheckerMetadata describes a check: which benchmark recommendation it covers and at what
/// compliance level, so the runner can select checks for the requested level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerMetadata {
    pub name: String,
    pub id: String,
    pub level: u8,
    pub title: String,
    pub mode: Mode,
}

impl fmt::Display for CheckerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = serde_json::to_string(&self).unwrap_or_default();
        write!(f, "{}", output)
    }
}

/// CheckerResult is the outcome of one assertion or one whole check: a status and the reason
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckerResult {
    pub status: CheckStatus,
    pub explanation: String,
}

impl CheckerResult {
    pub fn new<S: Into<String>>(status: CheckStatus, explanation: S) -> Self {
        Self {
            status,
            explanation: explanation.into(),
        }
    }

    pub fn pass<S: Into<String>>(explanation: S) -> Self {
        Self::new(CheckStatus::PASS, explanation)
    }

    pub fn fail<S: Into<String>>(explanation: S) -> Self {
        Self::new(CheckStatus::FAIL, explanation)
    }

    pub fn skip<S: Into<String>>(explanation: S) -> Self {
        Self::new(CheckStatus::SKIP, explanation)
    }

    pub fn error<S: Into<String>>(explanation: S) -> Self {
        Self::new(CheckStatus::ERROR, explanation)
    }
}

impl fmt::Display for CheckerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let output = serde_json::to_string(&self).unwrap_or_default();
        write!(f, "{}", output)
    }
}

/// The Checker trait defines the interface for a compliance check. Checkers provide metadata
/// about the check they perform, and execute that check against the inputs describing a node.
///
/// Execution never fails: a check that cannot be carried out reports `CheckStatus::ERROR`
/// with the reason in its explanation.
pub trait Checker {
    fn metadata(&self) -> CheckerMetadata;
    fn execute(&self, inputs: &NodeInputs) -> CheckerResult;
}

/// Used to help serialize output into simpler JSON structure.
#[derive(Debug, Serialize)]
pub struct IndividualResult {
    #[serde(flatten)]
    pub metadata: CheckerMetadata,
    #[serde(flatten)]
    pub result: CheckerResult,
}

/// ReportResults are the overall compliance checking containing the results of
/// all individual checks run.
#[derive(Debug, Serialize)]
pub struct ReportResults {
    pub level: u8,
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errored: usize,
    pub status: CheckStatus,
    pub timestamp: String,
    #[serde(flatten)]
    pub metadata: ReportMetadata,
    pub results: BTreeMap<String, IndividualResult>,
}

impl ReportResults {
    /// Initialize a new `ReportResults` with the default values.
    pub fn new(level: u8, metadata: ReportMetadata) -> Self {
        let current_time: DateTime<Utc> = Utc::now();
        ReportResults {
            level,
            total: 0,
            passed: 0,
            skipped: 0,
            failed: 0,
            errored: 0,
            status: CheckStatus::SKIP,
            timestamp: format!("{:?}", current_time),
            metadata,
            results: BTreeMap::new(),
        }
    }

    /// Add the results of a checker run to the overall results.
    pub fn add_result(&mut self, metadata: CheckerMetadata, result: CheckerResult) {
        self.total += 1;
        match result.status {
            CheckStatus::FAIL => {
                self.failed += 1;
                self.status = CheckStatus::FAIL;
            }
            CheckStatus::ERROR => {
                self.errored += 1;
                // A violation outranks an inconclusive check
                if self.status != CheckStatus::FAIL {
                    self.status = CheckStatus::ERROR;
                }
            }
            CheckStatus::PASS => {
                self.passed += 1;
                if self.status == CheckStatus::SKIP {
                    // We only want to mark as passing if at least one of the
                    // checks ran and passed
                    self.status = CheckStatus::PASS;
                }
            }
            CheckStatus::SKIP => {
                self.skipped += 1;
            }
        }
        self.results
            .insert(metadata.name.clone(), IndividualResult { metadata, result });
    }

    /// Whether at least one check ran automatically and came to a verdict.
    pub fn any_verdict(&self) -> bool {
        self.passed + self.failed > 0
    }
}

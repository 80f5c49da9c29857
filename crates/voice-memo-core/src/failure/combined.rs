use crate::failure::{FailureKind, FailureRecord, Severity};

use std::fmt;

use serde::Serialize;

/// Several failures raised by one operation, e.g. microphone and storage
/// both refused by a single permission request.
///
/// Members keep their own severity. The combined severity is the most
/// severe member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedFailure {
    failures: Vec<FailureRecord>,
}

impl CombinedFailure {
    /// Combine the given failures, preserving order.
    pub fn new(failures: Vec<FailureRecord>) -> Self {
        Self { failures }
    }

    /// The member failures.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Most severe member severity, `Info` when empty.
    pub fn severity(&self) -> Severity {
        self.failures
            .iter()
            .map(FailureRecord::severity)
            .max()
            .unwrap_or(Severity::Info)
    }

    /// Kind of the first member with the combined severity.
    pub fn kind(&self) -> FailureKind {
        let severity = self.severity();
        self.failures
            .iter()
            .find(|f| f.severity() == severity)
            .map(FailureRecord::kind)
            .unwrap_or(FailureKind::Unexpected)
    }

    /// Retryable only if every member is.
    pub fn is_retryable(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(FailureRecord::is_retryable)
    }

    /// Member messages joined into one line.
    pub fn message(&self) -> String {
        self.failures
            .iter()
            .map(FailureRecord::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<FailureRecord> for CombinedFailure {
    fn from_iter<I: IntoIterator<Item = FailureRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A failure as emitted by the controller: one record or several combined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "failure", rename_all = "snake_case")]
pub enum Failure {
    /// A single classified failure.
    Single(FailureRecord),
    /// Failures raised together by one operation.
    Combined(CombinedFailure),
}

impl Failure {
    /// Collapse a list of records, keeping a lone record unwrapped.
    ///
    /// Returns `None` for an empty list.
    pub fn from_records(mut records: Vec<FailureRecord>) -> Option<Self> {
        match records.len() {
            0 => None,
            1 => records.pop().map(Failure::Single),
            _ => Some(Failure::Combined(CombinedFailure::new(records))),
        }
    }

    /// Kind of the failure (most severe member when combined).
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Single(record) => record.kind(),
            Failure::Combined(combined) => combined.kind(),
        }
    }

    /// Severity of the failure (maximum member severity when combined).
    pub fn severity(&self) -> Severity {
        match self {
            Failure::Single(record) => record.severity(),
            Failure::Combined(combined) => combined.severity(),
        }
    }

    /// Whether the caller may re-issue the operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Failure::Single(record) => record.is_retryable(),
            Failure::Combined(combined) => combined.is_retryable(),
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Failure::Single(record) => record.message().to_string(),
            Failure::Combined(combined) => combined.message(),
        }
    }

    /// Every record in this failure.
    pub fn records(&self) -> &[FailureRecord] {
        match self {
            Failure::Single(record) => std::slice::from_ref(record),
            Failure::Combined(combined) => combined.failures(),
        }
    }

    /// Whether any record carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.records().iter().any(|r| r.error_code() == Some(code))
    }

    /// Log every record that should be logged.
    pub fn log(&self) {
        for record in self.records() {
            record.log();
        }
    }
}

impl From<FailureRecord> for Failure {
    fn from(record: FailureRecord) -> Self {
        Failure::Single(record)
    }
}

impl From<CombinedFailure> for Failure {
    fn from(combined: CombinedFailure) -> Self {
        Failure::Combined(combined)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Single(record) => record.fmt(f),
            Failure::Combined(combined) => {
                write!(f, "{} failures ({}): {}", combined.len(), combined.severity(), combined.message())
            }
        }
    }
}

impl std::error::Error for Failure {}

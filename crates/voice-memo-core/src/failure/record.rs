use crate::failure::{FailureKind, Severity};

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use tracing::{error, info, warn};

/// A single classified failure.
///
/// Severity and retryability are fixed when the record is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    kind: FailureKind,
    message: String,
    code: Option<String>,
    severity: Severity,
    retryable: bool,
    context: BTreeMap<String, String>,
}

impl FailureRecord {
    /// Create a record using the kind's default severity and retryability.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::with_severity(kind, kind.default_severity(), message)
    }

    /// Create a record with an explicit severity.
    pub fn with_severity(kind: FailureKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            severity,
            retryable: kind.default_retryable(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a machine-readable code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a context entry. Later entries with the same key win.
    pub fn context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Mark a storage or network failure as transient, making it retryable.
    ///
    /// Has no effect on kinds that are never retryable.
    pub fn transient(mut self) -> Self {
        if self.kind.supports_transient() {
            self.retryable = true;
        }
        self
    }

    /// Failure kind.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable description of what failed.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Machine-readable code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Severity assigned at construction.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether the caller may re-issue the operation.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Context entries, ordered by key.
    pub fn context_map(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Look up a single context entry.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Message for the end user, derived from the kind.
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    /// Informational failures are not logged.
    pub fn should_log(&self) -> bool {
        self.severity != Severity::Info
    }

    /// Emit this failure through `tracing` at a level matching its severity.
    pub fn log(&self) {
        if !self.should_log() {
            return;
        }

        let code = self.code.as_deref().unwrap_or("-");
        match self.severity {
            Severity::Critical | Severity::Error => error!(
                kind = %self.kind,
                code,
                severity = %self.severity,
                retryable = self.retryable,
                context = ?self.context,
                "{}",
                self.message
            ),
            Severity::Warning => warn!(
                kind = %self.kind,
                code,
                retryable = self.retryable,
                context = ?self.context,
                "{}",
                self.message
            ),
            Severity::Info => info!(kind = %self.kind, code, "{}", self.message),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}]: {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

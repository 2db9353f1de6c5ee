use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which check rejected a candidate document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A keyword of the specialized schema failed.
    Schema,
    /// The document does not decode into the typed plan.
    Decode,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// One rejected location of a candidate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// JSON pointer into the candidate; `/` is the root.
    pub pointer: String,
    /// Failing schema keyword (`const`, `minItems`, ...), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn schema(
        pointer: impl Into<String>,
        keyword: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: IssueKind::Schema,
            pointer: pointer.into(),
            keyword,
            message: message.into(),
        }
    }

    pub fn decode(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Decode,
            pointer: pointer.into(),
            keyword: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pointer, self.message)?;
        if let Some(keyword) = &self.keyword {
            write!(f, " [{}:{keyword}]", self.kind)?;
        } else {
            write!(f, " [{}]", self.kind)?;
        }
        Ok(())
    }
}

/// Everything a validator rejected in one candidate. Empty means accepted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// True when some issue points exactly at `pointer`.
    pub fn rejects(&self, pointer: &str) -> bool {
        self.issues.iter().any(|issue| issue.pointer == pointer)
    }

    /// One-line digest of the first `limit` issues.
    pub fn summary(&self, limit: usize) -> String {
        let mut parts: Vec<String> = self
            .issues
            .iter()
            .take(limit)
            .map(|issue| format!("{} {}", issue.pointer, issue.message))
            .collect();
        if self.issues.len() > limit {
            parts.push(format!("... {} more", self.issues.len() - limit));
        }
        parts.join("; ")
    }
}

/// Checks a candidate document against a run's contract.
pub trait DocumentValidator {
    fn validate(&self, document: &Value) -> ValidationReport;
}

/// Validator used when schema validation is switched off; accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DocumentValidator for AcceptAll {
    fn validate(&self, _document: &Value) -> ValidationReport {
        ValidationReport::default()
    }
}

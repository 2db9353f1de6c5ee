use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attempt bound and fixed delay between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

/// Outcome of one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    /// `transport`, `parse` or `validation`.
    pub kind: String,
    pub error: String,
}

/// Repairs applied by one enforcement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementReport {
    /// The candidate was not a JSON object and was replaced.
    pub replaced_root: bool,
    pub stripped_keys: Vec<String>,
    pub relocked_paths: Vec<String>,
    pub dropped_entries: u64,
    pub reassigned_entries: u64,
    pub completed_entries: u64,
    pub backfilled: BTreeMap<String, u64>,
    pub truncated: BTreeMap<String, u64>,
    pub rebalanced: Vec<String>,
    pub selection_fills: BTreeMap<String, u64>,
}

impl EnforcementReport {
    pub fn record_replaced_root(&mut self) {
        self.replaced_root = true;
    }

    pub fn record_stripped(&mut self, path: impl Into<String>) {
        self.stripped_keys.push(path.into());
    }

    pub fn record_relocked(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.relocked_paths.contains(&path) {
            self.relocked_paths.push(path);
        }
    }

    pub fn record_dropped(&mut self) {
        self.dropped_entries += 1;
    }

    pub fn record_reassigned(&mut self) {
        self.reassigned_entries += 1;
    }

    pub fn record_completed(&mut self) {
        self.completed_entries += 1;
    }

    pub fn record_backfill(&mut self, category: &str) {
        *self.backfilled.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn record_truncation(&mut self, category: &str, removed: u64) {
        *self.truncated.entry(category.to_string()).or_insert(0) += removed;
    }

    pub fn record_rebalanced(&mut self, category: &str) {
        self.rebalanced.push(category.to_string());
    }

    pub fn record_selection_fill(&mut self, path: &str, appended: u64) {
        *self.selection_fills.entry(path.to_string()).or_insert(0) += appended;
    }

    /// True when the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Total count of individual repairs.
    pub fn repairs(&self) -> u64 {
        u64::from(self.replaced_root)
            + self.stripped_keys.len() as u64
            + self.relocked_paths.len() as u64
            + self.dropped_entries
            + self.reassigned_entries
            + self.completed_entries
            + self.backfilled.values().sum::<u64>()
            + self.truncated.values().sum::<u64>()
            + self.rebalanced.len() as u64
            + self.selection_fills.len() as u64
    }
}

/// Schema-valid document accepted by the orchestrator.
#[derive(Debug, Clone)]
pub struct AcceptedDocument {
    pub document: Value,
    /// 1-based number of the accepted attempt.
    pub attempts: u32,
    /// Failures of earlier attempts, oldest first.
    pub history: Vec<AttemptRecord>,
    pub report: EnforcementReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_keeps_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 2);
        assert_eq!(RetryPolicy::default().delay(), Duration::from_millis(500));
    }

    #[test]
    fn report_counts_repairs() {
        let mut report = EnforcementReport::default();
        assert!(report.is_clean());

        report.record_relocked("constraints.tone");
        report.record_relocked("constraints.tone");
        report.record_backfill("III");
        report.record_backfill("III");
        report.record_truncation("II", 1);
        assert!(!report.is_clean());
        assert_eq!(report.relocked_paths.len(), 1);
        assert_eq!(report.repairs(), 4);
    }
}

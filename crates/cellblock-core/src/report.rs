//! Security reporting over recorded violations and executions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::history::SharedHistory;
use crate::violations::SharedViolationStore;

/// Violation counts above which a user or service is high risk
const HIGH_RISK_THRESHOLD: usize = 10;
/// Violation counts above which a user or service is medium risk
const MEDIUM_RISK_THRESHOLD: usize = 5;

/// Aggregate risk derived from violation counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Risk level for a number of violations
    pub fn from_violation_count(count: usize) -> Self {
        if count > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if count > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Security summary, recomputed on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Executions still in the history
    pub total_executions: usize,
    /// Recorded violations
    pub violation_count: usize,
    /// Executions in the history that were blocked
    pub blocked_count: usize,
    /// Violation counts keyed by type name
    pub violation_types: BTreeMap<String, usize>,
    /// Derived risk
    pub risk_level: RiskLevel,
}

/// Builds [`SecurityReport`]s from the service's stores
#[derive(Clone)]
pub struct SecurityReporter {
    history: SharedHistory,
    violations: SharedViolationStore,
}

impl SecurityReporter {
    pub fn new(history: SharedHistory, violations: SharedViolationStore) -> Self {
        Self {
            history,
            violations,
        }
    }

    /// Summarize everything, or one user's activity
    pub fn report(&self, user_id: Option<&str>) -> SecurityReport {
        let summary = self.violations.summary(user_id);

        let executions = match user_id {
            Some(id) => self.history.query_by_user(id, usize::MAX),
            None => self.history.recent(usize::MAX),
        };
        let blocked_count = executions.iter().filter(|r| r.is_blocked()).count();

        let violation_types = summary
            .by_type
            .iter()
            .map(|(vtype, count)| (vtype.as_str().to_string(), *count))
            .collect();

        SecurityReport {
            total_executions: executions.len(),
            violation_count: summary.total,
            blocked_count,
            violation_types,
            risk_level: RiskLevel::from_violation_count(summary.total),
        }
    }

    /// Shared history store
    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    /// Shared violation store
    pub fn violations(&self) -> &SharedViolationStore {
        &self.violations
    }
}

impl std::fmt::Debug for SecurityReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityReporter")
            .field("executions", &self.history.len())
            .field("violations", &self.violations.total_count())
            .finish()
    }
}

//! Violation types for security tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of rule that rejected a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Import of a denylisted module
    BlockedImport,
    /// Call of a denylisted builtin
    BlockedCallable,
    /// Match of a denylisted text pattern
    BlockedPattern,
    /// Nesting, line length or function count over threshold
    ExcessiveComplexity,
    /// Encoding, URL, path traversal or shell keyword
    SuspiciousContent,
    /// Source or stdin larger than allowed
    OversizedInput,
}

impl ViolationType {
    /// Get a human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::BlockedImport => "blocked_import",
            ViolationType::BlockedCallable => "blocked_callable",
            ViolationType::BlockedPattern => "blocked_pattern",
            ViolationType::ExcessiveComplexity => "excessive_complexity",
            ViolationType::SuspiciousContent => "suspicious_content",
            ViolationType::OversizedInput => "oversized_input",
        }
    }

    /// Get the default severity for this violation type
    pub fn default_severity(&self) -> Severity {
        match self {
            ViolationType::BlockedImport => Severity::High,
            ViolationType::BlockedCallable => Severity::High,
            ViolationType::BlockedPattern => Severity::High,
            ViolationType::ExcessiveComplexity => Severity::Medium,
            ViolationType::SuspiciousContent => Severity::High,
            ViolationType::OversizedInput => Severity::Medium,
        }
    }
}

/// Severity level of a verdict or violation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing matched
    #[default]
    None,
    /// Shape of the code is suspicious
    Medium,
    /// Direct attempt at a denied capability
    High,
}

impl Severity {
    /// Get a human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// A recorded security violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation
    pub violation_type: ViolationType,
    /// Severity level
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// The text that triggered the violation
    pub trigger: String,
    /// Submitting user
    pub user_id: String,
    /// When the violation was recorded
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    /// Create a new violation with the type's default severity
    pub fn new(
        violation_type: ViolationType,
        message: impl Into<String>,
        trigger: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            severity: violation_type.default_severity(),
            message: message.into(),
            trigger: trigger.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_type_severity() {
        assert_eq!(
            ViolationType::BlockedImport.default_severity(),
            Severity::High
        );
        assert_eq!(
            ViolationType::ExcessiveComplexity.default_severity(),
            Severity::Medium
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::None);
    }

    #[test]
    fn test_violation_serialization() {
        let v = Violation::new(
            ViolationType::BlockedCallable,
            "Blocked function: exec",
            "exec(",
            "alice",
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["violation_type"], "blocked_callable");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["user_id"], "alice");
    }
}

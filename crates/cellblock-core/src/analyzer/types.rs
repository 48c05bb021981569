//! Verdict types produced by the static analyzer.

use serde::{Deserialize, Serialize};

use crate::violations::{Severity, ViolationType};

/// Outcome of analyzing one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityVerdict {
    /// Whether the code may run
    pub safe: bool,
    /// Human-readable reason for rejection
    pub violation: Option<String>,
    /// Severity of the matched rule
    pub severity: Severity,
    /// Kind of rule that matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_type: Option<ViolationType>,
    /// Text that triggered the rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl SecurityVerdict {
    /// Create a passing verdict
    pub fn pass() -> Self {
        Self {
            safe: true,
            violation: None,
            severity: Severity::None,
            violation_type: None,
            trigger: None,
        }
    }

    /// Create a rejecting verdict with the type's default severity
    pub fn block(violation_type: ViolationType, message: impl Into<String>) -> Self {
        Self {
            safe: false,
            violation: Some(message.into()),
            severity: violation_type.default_severity(),
            violation_type: Some(violation_type),
            trigger: None,
        }
    }

    /// Attach the matched text
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Rejection message, empty for a passing verdict
    pub fn message(&self) -> &str {
        self.violation.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_pass() {
        let verdict = SecurityVerdict::pass();
        assert!(verdict.safe);
        assert!(verdict.violation.is_none());
        assert_eq!(verdict.severity, Severity::None);
        assert_eq!(verdict.message(), "");
    }

    #[test]
    fn test_verdict_block() {
        let verdict = SecurityVerdict::block(ViolationType::ExcessiveComplexity, "Too many function definitions");
        assert!(!verdict.safe);
        assert_eq!(verdict.severity, Severity::Medium);
        assert_eq!(verdict.message(), "Too many function definitions");
    }

    #[test]
    fn test_verdict_json_shape() {
        let json = serde_json::to_value(SecurityVerdict::pass()).unwrap();
        assert_eq!(json["safe"], true);
        assert_eq!(json["severity"], "none");
        assert!(json.get("violation_type").is_none());
    }
}

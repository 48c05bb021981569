//! Thread-safe violation storage.

use super::types::{Severity, Violation, ViolationType};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Thread-safe violation store
pub type SharedViolationStore = Arc<ViolationStore>;

/// Bounded store of recent violations, oldest evicted first
#[derive(Debug)]
pub struct ViolationStore {
    violations: RwLock<VecDeque<Violation>>,
    max_violations: usize,
}

impl Default for ViolationStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ViolationStore {
    /// Create a new violation store with max capacity
    pub fn new(max_violations: usize) -> Self {
        Self {
            violations: RwLock::new(VecDeque::new()),
            max_violations: max_violations.max(1),
        }
    }

    /// Create a shared (Arc-wrapped) store
    pub fn shared(max_violations: usize) -> SharedViolationStore {
        Arc::new(Self::new(max_violations))
    }

    /// Record a new violation
    pub fn record(&self, violation: Violation) {
        let mut violations = self.violations.write();
        while violations.len() >= self.max_violations {
            violations.pop_front();
        }
        violations.push_back(violation);
    }

    /// Get all violations, oldest first
    pub fn get_all(&self) -> Vec<Violation> {
        self.violations.read().iter().cloned().collect()
    }

    /// Get violations recorded for one user, oldest first
    pub fn get_by_user(&self, user_id: &str) -> Vec<Violation> {
        self.violations
            .read()
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Get violations of a specific type
    pub fn get_by_type(&self, vtype: ViolationType) -> Vec<Violation> {
        self.violations
            .read()
            .iter()
            .filter(|v| v.violation_type == vtype)
            .cloned()
            .collect()
    }

    /// Get total violation count
    pub fn total_count(&self) -> usize {
        self.violations.read().len()
    }

    /// Clear all violations
    pub fn clear(&self) {
        self.violations.write().clear();
    }

    /// Summarize violations, optionally for one user
    pub fn summary(&self, user_id: Option<&str>) -> ViolationSummary {
        let violations = self.violations.read();
        let mut summary = ViolationSummary::default();

        for v in violations
            .iter()
            .filter(|v| user_id.map_or(true, |id| v.user_id == id))
        {
            summary.total += 1;
            *summary.by_type.entry(v.violation_type).or_insert(0) += 1;
            *summary.by_severity.entry(v.severity).or_insert(0) += 1;
            if v.severity == Severity::High {
                summary.high_severity += 1;
            }
        }
        summary
    }
}

/// Summary of violations
#[derive(Debug, Clone, Default)]
pub struct ViolationSummary {
    /// Total number of violations
    pub total: usize,
    /// Number of high-severity violations
    pub high_severity: usize,
    /// Count by type
    pub by_type: HashMap<ViolationType, usize>,
    /// Count by severity
    pub by_severity: HashMap<Severity, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(vtype: ViolationType, user: &str) -> Violation {
        Violation::new(vtype, "test", "trigger", user)
    }

    #[test]
    fn test_store_record_and_get() {
        let store = ViolationStore::new(100);

        store.record(violation(ViolationType::BlockedImport, "alice"));
        store.record(violation(ViolationType::ExcessiveComplexity, "bob"));

        assert_eq!(store.total_count(), 2);
        assert_eq!(store.get_by_user("alice").len(), 1);
        assert_eq!(store.get_by_type(ViolationType::ExcessiveComplexity).len(), 1);
    }

    #[test]
    fn test_store_max_capacity() {
        let store = ViolationStore::new(3);

        for i in 0..5 {
            store.record(Violation::new(
                ViolationType::BlockedPattern,
                format!("test {}", i),
                format!("cmd {}", i),
                "alice",
            ));
        }

        assert_eq!(store.total_count(), 3);
        // Should have kept the most recent
        let violations = store.get_all();
        assert!(violations[0].message.contains("2"));
        assert!(violations[2].message.contains("4"));
    }

    #[test]
    fn test_store_summary() {
        let store = ViolationStore::new(100);

        store.record(violation(ViolationType::BlockedImport, "alice"));
        store.record(violation(ViolationType::BlockedImport, "alice"));
        store.record(violation(ViolationType::ExcessiveComplexity, "bob"));

        let summary = store.summary(None);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high_severity, 2);
        assert_eq!(summary.by_type[&ViolationType::BlockedImport], 2);
        assert_eq!(summary.by_severity[&Severity::Medium], 1);

        let alice = store.summary(Some("alice"));
        assert_eq!(alice.total, 2);
        assert!(!alice.by_type.contains_key(&ViolationType::ExcessiveComplexity));
    }

    #[test]
    fn test_store_clear() {
        let store = ViolationStore::new(100);
        store.record(violation(ViolationType::BlockedCallable, "alice"));
        assert_eq!(store.total_count(), 1);

        store.clear();
        assert_eq!(store.total_count(), 0);
    }

    #[test]
    fn test_shared_store() {
        let store = ViolationStore::shared(100);
        store.record(violation(ViolationType::SuspiciousContent, "alice"));

        let store2 = Arc::clone(&store);
        assert_eq!(store2.total_count(), 1);
    }

    #[test]
    fn test_concurrent_recording() {
        let store = ViolationStore::shared(50);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        store.record(violation(ViolationType::BlockedImport, &format!("u{}", t)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.total_count(), 50);
    }
}

//! Bounded execution history.
//!
//! The service is handed a [`HistoryStore`] at construction instead of
//! keeping process-wide state. [`InMemoryHistory`] is the default: a FIFO
//! ring that evicts the oldest result once full.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::service::ExecutionResult;

/// Storage for completed execution results
pub trait HistoryStore: Send + Sync {
    /// Append a result, evicting the oldest entries beyond capacity
    fn append(&self, result: ExecutionResult);

    /// Results of one user, most recent first, at most `limit`
    fn query_by_user(&self, user_id: &str, limit: usize) -> Vec<ExecutionResult>;

    /// Results of all users, most recent first, at most `limit`
    fn recent(&self, limit: usize) -> Vec<ExecutionResult>;

    /// Number of stored results
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared history store
pub type SharedHistory = Arc<dyn HistoryStore>;

/// FIFO in-memory history
#[derive(Debug)]
pub struct InMemoryHistory {
    entries: Mutex<VecDeque<ExecutionResult>>,
    capacity: usize,
}

impl InMemoryHistory {
    /// Create a history keeping at most `capacity` results
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Maximum number of stored results
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, result: ExecutionResult) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(result);
    }

    fn query_by_user(&self, user_id: &str, limit: usize) -> Vec<ExecutionResult> {
        self.entries
            .lock()
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    fn recent(&self, limit: usize) -> Vec<ExecutionResult> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(user: &str, stdout: &str) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            ..ExecutionResult::error(user, 0, "test")
        }
    }

    #[test]
    fn test_query_filters_by_user() {
        let history = InMemoryHistory::new(10);
        history.append(result("alice", "1"));
        history.append(result("bob", "2"));
        history.append(result("alice", "3"));

        let alice = history.query_by_user("alice", 10);
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|r| r.user_id == "alice"));
        // Most recent first
        assert_eq!(alice[0].stdout, "3");
        assert_eq!(alice[1].stdout, "1");
    }

    #[test]
    fn test_query_respects_limit() {
        let history = InMemoryHistory::new(10);
        for i in 0..5 {
            history.append(result("alice", &i.to_string()));
        }
        let entries = history.query_by_user("alice", 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stdout, "4");
        assert!(history.query_by_user("alice", 0).is_empty());
        assert!(history.query_by_user("carol", 10).is_empty());
    }

    #[test]
    fn test_fifo_eviction() {
        let history = InMemoryHistory::new(3);
        for i in 0..5 {
            history.append(result("alice", &i.to_string()));
        }
        assert_eq!(history.len(), 3);
        let stdout: Vec<_> = history.recent(10).into_iter().map(|r| r.stdout).collect();
        assert_eq!(stdout, ["4", "3", "2"]);
    }

    #[test]
    fn test_concurrent_appends() {
        let history = Arc::new(InMemoryHistory::new(50));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        history.append(result(&format!("u{}", t), &i.to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 50);
    }

    #[test]
    fn test_empty() {
        let history = InMemoryHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 100);
    }
}

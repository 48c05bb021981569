//! Violation tracking.
//!
//! Every rejected submission is recorded here so the security reporter can
//! aggregate it later.

mod store;
mod types;

pub use store::{SharedViolationStore, ViolationStore, ViolationSummary};
pub use types::{Severity, Violation, ViolationType};

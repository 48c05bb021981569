//! Analyzer rule-set selection.

use serde::{Deserialize, Serialize};

/// Which analyzer layers run before execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleSet {
    /// Import, callable and pattern denylists only
    Basic,
    /// Denylists plus structural complexity and suspicious-content heuristics
    #[default]
    Enhanced,
}

impl RuleSet {
    /// Whether the structural complexity layer runs
    pub fn checks_structure(&self) -> bool {
        matches!(self, RuleSet::Enhanced)
    }

    /// Whether the suspicious-content layer runs
    pub fn checks_heuristics(&self) -> bool {
        matches!(self, RuleSet::Enhanced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSet::Basic => "basic",
            RuleSet::Enhanced => "enhanced",
        }
    }
}

impl std::str::FromStr for RuleSet {
    type Err = crate::error::CellblockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(RuleSet::Basic),
            "enhanced" | "strict" => Ok(RuleSet::Enhanced),
            _ => Err(crate::error::CellblockError::config(format!(
                "Invalid rule set: {}. Valid: basic, enhanced",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

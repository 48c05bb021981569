//! Static analysis of submitted source.
//!
//! The analyzer is a denylist: it rejects source that textually matches a
//! blocked import, a blocked builtin call, a blocked pattern, a structural
//! threshold or a suspicious-content heuristic. Layers run in that order and
//! the first match wins.
//!
//! Denylist matching is inherently incomplete. Indirection (`"o" + "s"` fed
//! to a dynamic lookup), homoglyphs and encodings all evade it. The stripped
//! builtins and OS limits applied by the sandbox are the containment layer;
//! this is only a fast first-pass filter.

mod structure;
mod types;

pub use types::SecurityVerdict;

use regex::{Regex, RegexBuilder};

use crate::config::{AnalysisConfig, ExecutionConfig};
use crate::error::CellblockResult;
use crate::violations::ViolationType;

/// Dunder access is always blocked in addition to the configured patterns
const DUNDER_PATTERN: &str = r"__\w+__";

/// A compiled rule and the verdict it produces
#[derive(Debug, Clone)]
struct Rule {
    regex: Regex,
    violation_type: ViolationType,
    message: String,
}

impl Rule {
    fn new(
        pattern: &str,
        violation_type: ViolationType,
        message: impl Into<String>,
    ) -> CellblockResult<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            regex,
            violation_type,
            message: message.into(),
        })
    }

    fn check(&self, source: &str) -> Option<SecurityVerdict> {
        self.regex.find(source).map(|m| {
            SecurityVerdict::block(self.violation_type, self.message.clone())
                .with_trigger(m.as_str())
        })
    }
}

/// Rejects source matching the configured denylists and heuristics
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    max_source_bytes: usize,
    imports: Vec<Rule>,
    callables: Vec<Rule>,
    patterns: Vec<Rule>,
    suspicious: Vec<Rule>,
    analysis: AnalysisConfig,
}

impl StaticAnalyzer {
    /// Compile every rule in the configuration
    pub fn new(config: &ExecutionConfig) -> CellblockResult<Self> {
        let analysis = &config.analysis;

        let mut imports = Vec::with_capacity(analysis.blocked_modules.len() * 2);
        for module in &analysis.blocked_modules {
            let escaped = regex::escape(module);
            // `import os`, `import os.path`, `import math, os as o`
            imports.push(Rule::new(
                &format!(
                    r"\bimport\s+(?:[\w.]+(?:\s+as\s+\w+)?\s*,\s*)*{}\b",
                    escaped
                ),
                ViolationType::BlockedImport,
                format!("Blocked import: {}", module),
            )?);
            // `from os import x`, `from os.path import x`
            imports.push(Rule::new(
                &format!(r"\bfrom\s+{}(?:\.\w+)*\s+import\b", escaped),
                ViolationType::BlockedImport,
                format!("Blocked import from: {}", module),
            )?);
        }

        let callables = analysis
            .blocked_callables
            .iter()
            .map(|name| {
                Rule::new(
                    &format!(r"\b{}\s*\(", regex::escape(name.trim())),
                    ViolationType::BlockedCallable,
                    format!("Blocked function: {}", name.trim()),
                )
            })
            .collect::<CellblockResult<Vec<_>>>()?;

        let mut patterns = analysis
            .blocked_text_patterns
            .iter()
            .map(|pattern| {
                Rule::new(
                    pattern,
                    ViolationType::BlockedPattern,
                    format!("Blocked pattern detected: {}", pattern),
                )
            })
            .collect::<CellblockResult<Vec<_>>>()?;
        if !analysis
            .blocked_text_patterns
            .iter()
            .any(|p| p == DUNDER_PATTERN)
        {
            patterns.push(Rule::new(
                DUNDER_PATTERN,
                ViolationType::BlockedPattern,
                format!("Blocked pattern detected: {}", DUNDER_PATTERN),
            )?);
        }

        let suspicious = analysis
            .suspicious_patterns
            .iter()
            .map(|p| Rule::new(&p.pattern, ViolationType::SuspiciousContent, &p.message))
            .collect::<CellblockResult<Vec<_>>>()?;

        tracing::debug!(
            imports = imports.len(),
            callables = callables.len(),
            patterns = patterns.len(),
            suspicious = suspicious.len(),
            rule_set = analysis.rule_set.as_str(),
            "compiled analyzer rules"
        );

        Ok(Self {
            max_source_bytes: config.max_source_bytes,
            imports,
            callables,
            patterns,
            suspicious,
            analysis: analysis.clone(),
        })
    }

    /// Analyze source and return the first matching verdict
    pub fn check(&self, source: &str) -> SecurityVerdict {
        if source.len() > self.max_source_bytes {
            return SecurityVerdict::block(
                ViolationType::OversizedInput,
                format!(
                    "Code too large: {} bytes exceeds limit of {} bytes",
                    source.len(),
                    self.max_source_bytes
                ),
            );
        }

        let denylists = self
            .imports
            .iter()
            .chain(&self.callables)
            .chain(&self.patterns);
        if let Some(verdict) = denylists.filter_map(|rule| rule.check(source)).next() {
            return verdict;
        }

        let rule_set = self.analysis.rule_set;
        if rule_set.checks_structure() {
            if let Some(verdict) = self.check_structure(source) {
                return verdict;
            }
        }
        if rule_set.checks_heuristics() {
            if let Some(verdict) = self
                .suspicious
                .iter()
                .filter_map(|rule| rule.check(source))
                .next()
            {
                return verdict;
            }
        }

        SecurityVerdict::pass()
    }

    fn check_structure(&self, source: &str) -> Option<SecurityVerdict> {
        let indent = structure::max_indent(source);
        if indent > self.analysis.max_indent_columns {
            return Some(
                SecurityVerdict::block(
                    ViolationType::ExcessiveComplexity,
                    "Excessive code nesting detected",
                )
                .with_trigger(format!("{} columns", indent)),
            );
        }

        if let Some((line, len)) = structure::first_long_line(source, self.analysis.max_line_length)
        {
            return Some(
                SecurityVerdict::block(
                    ViolationType::ExcessiveComplexity,
                    "Line too long (potential obfuscation)",
                )
                .with_trigger(format!("line {}: {} characters", line, len)),
            );
        }

        let defs = structure::count_function_defs(source);
        if defs > self.analysis.max_function_defs {
            return Some(
                SecurityVerdict::block(
                    ViolationType::ExcessiveComplexity,
                    "Too many function definitions",
                )
                .with_trigger(format!("{} definitions", defs)),
            );
        }

        None
    }
}

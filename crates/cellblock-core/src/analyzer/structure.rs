//! Structural complexity checks.
//!
//! Deep nesting, very long lines and large numbers of function definitions
//! are typical of generated or obfuscated payloads.

use regex::Regex;
use std::sync::LazyLock;

/// A `def` statement at the start of a line, including `async def`
static FUNCTION_DEF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]").unwrap());

const TAB_WIDTH: usize = 4;

/// Deepest leading whitespace of any non-blank line, in columns
pub fn max_indent(source: &str) -> usize {
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(indent_columns)
        .max()
        .unwrap_or(0)
}

fn indent_columns(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// First line longer than `limit` characters, as (1-based line number, length)
pub fn first_long_line(source: &str, limit: usize) -> Option<(usize, usize)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.chars().count()))
        .find(|(_, len)| *len > limit)
}

/// Number of function definitions
pub fn count_function_defs(source: &str) -> usize {
    FUNCTION_DEF_PATTERN.find_iter(source).count()
}

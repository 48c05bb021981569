//! Post-execution analysis.

use std::time::Duration;

use super::types::SecurityLevel;
use crate::runner::RunOutput;

/// Share of the wall-clock budget after which a run is flagged as slow
const SLOW_RUN_RATIO: f64 = 0.8;

/// Warnings raised by a completed run
pub fn warnings(output: &RunOutput, elapsed: Duration, wall_time: Duration) -> Vec<String> {
    let mut warnings = Vec::new();

    if elapsed.as_secs_f64() > wall_time.as_secs_f64() * SLOW_RUN_RATIO {
        warnings.push("Execution time approaching limit".to_string());
    }
    if output.truncated {
        warnings.push("Output size exceeds limit".to_string());
    }
    if output.stderr.to_lowercase().contains("error") {
        warnings.push("Execution produced errors".to_string());
    }
    if output.timed_out {
        warnings.push("Code execution timed out".to_string());
    }

    warnings
}

/// Security level for a completed run
pub fn level(warnings: &[String]) -> SecurityLevel {
    match warnings.len() {
        0 => SecurityLevel::Safe,
        1 | 2 => SecurityLevel::Warning,
        _ => SecurityLevel::HighRisk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALL: Duration = Duration::from_secs(5);

    #[test]
    fn test_clean_run() {
        let output = RunOutput::default();
        let warnings = warnings(&output, Duration::from_millis(50), WALL);
        assert!(warnings.is_empty());
        assert_eq!(level(&warnings), SecurityLevel::Safe);
    }

    #[test]
    fn test_error_output() {
        let output = RunOutput {
            exit_code: 1,
            stderr: "Traceback...\nZeroDivisionError: division by zero\n".to_string(),
            ..Default::default()
        };
        let warnings = warnings(&output, Duration::from_millis(50), WALL);
        assert_eq!(warnings, ["Execution produced errors"]);
        assert_eq!(level(&warnings), SecurityLevel::Warning);
    }

    #[test]
    fn test_slow_truncated_failing_run() {
        let output = RunOutput {
            stderr: "RuntimeError".to_string(),
            truncated: true,
            ..Default::default()
        };
        let warnings = warnings(&output, Duration::from_millis(4500), WALL);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0], "Execution time approaching limit");
        assert_eq!(level(&warnings), SecurityLevel::HighRisk);
    }

    #[test]
    fn test_timeout() {
        let output = RunOutput {
            timed_out: true,
            stderr: "Code execution timed out after 5 seconds".to_string(),
            ..Default::default()
        };
        let warnings = warnings(&output, Duration::from_millis(5010), WALL);
        assert_eq!(
            warnings,
            ["Execution time approaching limit", "Code execution timed out"]
        );
    }
}

//! Run report: console summary and JSON artifact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::recorder::TestResult;

/// Aggregate counts over a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Passed checks as a percentage of all checks; 0.0 for an empty run.
    pub success_rate: f64,
}

impl ReportSummary {
    /// Summarizes the given results.
    pub fn from_results(results: &[TestResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            (passed as f64 / total as f64) * 100.0
        };

        Self {
            total,
            passed,
            failed: total - passed,
            success_rate,
        }
    }
}

/// Renders the console summary.
pub fn format_summary(results: &[TestResult]) -> String {
    let summary = ReportSummary::from_results(results);
    let rule = "=".repeat(40);

    let mut out = String::new();
    out.push_str(&format!("\n{}\n  Test report summary\n{}\n", rule, rule));
    out.push_str(&format!("Total:        {}\n", summary.total));
    out.push_str(&format!("Passed:       {}\n", summary.passed));
    out.push_str(&format!("Failed:       {}\n", summary.failed));
    out.push_str(&format!("Success rate: {:.2}%\n", summary.success_rate));
    out.push_str("\nResults:\n");
    for result in results {
        out.push_str(&format!(
            "  {} {} - {}\n",
            result.status_tag(),
            result.name,
            result.details
        ));
    }
    out
}

/// Returns the report file name for a run finishing at `at`.
pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("test_report_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Writes the results as a pretty-printed JSON array into `dir`.
///
/// The directory is created if missing. Returns the written path.
pub fn write_json(results: &[TestResult], dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(results).map_err(|e| Error::Report(e.to_string()))?;
    let path = dir.join(report_file_name(Local::now()));
    std::fs::write(&path, json)?;

    tracing::info!(path = %path.display(), entries = results.len(), "report written");
    Ok(path)
}

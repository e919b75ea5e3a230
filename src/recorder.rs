//! Append-only log of check results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one check, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Check name.
    pub name: String,
    /// Whether the check passed.
    pub success: bool,
    /// Human-readable diagnostic.
    pub details: String,
    /// When the check concluded.
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    /// Returns the console status tag.
    pub fn status_tag(&self) -> &'static str {
        if self.success {
            "[PASS]"
        } else {
            "[FAIL]"
        }
    }
}

/// Ordered record of every attempted check.
///
/// Entries can only be appended; insertion order is execution order.
#[derive(Debug, Default)]
pub struct Recorder {
    results: Vec<TestResult>,
    echo: bool,
}

impl Recorder {
    /// Creates a silent recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that also prints each entry to stdout as it lands.
    pub fn with_echo() -> Self {
        Self {
            results: Vec::new(),
            echo: true,
        }
    }

    /// Appends a result stamped with the current time.
    pub fn record(&mut self, name: impl Into<String>, success: bool, details: impl Into<String>) {
        let result = TestResult {
            name: name.into(),
            success,
            details: details.into(),
            timestamp: Utc::now(),
        };

        tracing::debug!(check = %result.name, success, "recorded result");
        if self.echo {
            println!("  {} {}: {}", result.status_tag(), result.name, result.details);
        }

        self.results.push(result);
    }

    /// Returns all results in execution order.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Returns the number of recorded results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Consumes the recorder, returning the results.
    pub fn into_results(self) -> Vec<TestResult> {
        self.results
    }
}

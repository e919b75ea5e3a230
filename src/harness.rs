//! Run controller.
//!
//! Walks [`Step::ORDER`], threading the [`RunContext`] from step to step.
//! A missing token after the login step ends the run early; everything
//! else runs regardless of earlier failures.

use std::path::PathBuf;

use crate::client::ApiClient;
use crate::config::ProbeConfig;
use crate::recorder::{Recorder, TestResult};
use crate::report::{self, ReportSummary};
use crate::steps::{run_step, RunContext, Step, StepEnv};

/// Result of a full probe run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Every recorded check, in execution order.
    pub results: Vec<TestResult>,
    /// True if the run stopped after a failed login.
    pub aborted: bool,
    /// Context as left by the last step.
    pub context: RunContext,
    /// Path of the JSON report, if one was written.
    pub report_path: Option<PathBuf>,
}

impl RunOutcome {
    /// Returns the aggregate counts.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_results(&self.results)
    }

    /// Process exit code: 0 for a completed run, 1 for an aborted one.
    pub fn exit_code(&self) -> u8 {
        if self.aborted {
            1
        } else {
            0
        }
    }
}

/// Drives the backend through every step in order.
pub struct ProbeHarness<C: ApiClient> {
    client: C,
    config: ProbeConfig,
    echo: bool,
}

impl<C: ApiClient> ProbeHarness<C> {
    /// Creates a harness with the given client and configuration.
    pub fn new(client: C, config: ProbeConfig) -> Self {
        Self {
            client,
            config,
            echo: false,
        }
    }

    /// Prints scenario headings, live results and the summary to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Returns the client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Runs every enabled step, then emits the report.
    pub async fn run(&self) -> RunOutcome {
        let env = StepEnv::new(&self.client, &self.config);
        let mut recorder = if self.echo {
            Recorder::with_echo()
        } else {
            Recorder::new()
        };
        let mut ctx = RunContext::new();
        let mut aborted = false;

        tracing::info!(base_url = %self.client.base_url(), "starting probe run");

        for step in Step::ORDER {
            // Report is emitted after the loop, aborted or not
            if step == Step::Report {
                break;
            }
            if !self.config.is_enabled(step) {
                tracing::info!(step = %step, "step skipped by configuration");
                continue;
            }

            if self.echo {
                println!("\n[Test] {}", step.title());
            }
            tracing::debug!(step = %step, "running step");

            ctx = run_step(step, &env, ctx, &mut recorder).await;
            tracing::debug!(step = %step, recorded = recorder.len(), "step finished");

            // Nothing after login can run without a token
            if step == Step::Authenticate && !ctx.is_authenticated() {
                tracing::error!("no token obtained; aborting run");
                if self.echo {
                    println!("\nCould not obtain a token, aborting run");
                }
                aborted = true;
                break;
            }
        }

        // Report
        let results = recorder.into_results();
        let report_path = self.emit_report(&results);

        let outcome = RunOutcome {
            results,
            aborted,
            context: ctx,
            report_path,
        };

        let summary = outcome.summary();
        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            aborted,
            "probe run finished"
        );

        outcome
    }

    /// Prints the summary and writes the JSON file.
    ///
    /// A write failure is logged; it does not change the run's outcome.
    fn emit_report(&self, results: &[TestResult]) -> Option<PathBuf> {
        if self.echo {
            print!("{}", report::format_summary(results));
        }

        if !self.config.report.write_file {
            return None;
        }

        match report::write_json(results, &self.config.report.dir) {
            Ok(path) => {
                if self.echo {
                    println!("\nReport saved to: {}", path.display());
                }
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, dir = %self.config.report.dir.display(), "failed to write report");
                None
            }
        }
    }
}

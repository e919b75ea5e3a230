//! Backend Probe - end-to-end checks for a backend's HTTP API
//!
//! This library drives a running backend through a fixed sequence of dependent
//! calls (health, login, provider configuration, model listing, chat, workflow,
//! negative paths), judges each response against its contract, and reports the
//! ordered pass/fail log.

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod harness;
pub mod recorder;
pub mod report;
pub mod steps;

pub use error::{Error, Result};

pub use client::{ApiClient, ApiRequest, ApiResponse, BodyMode, HttpClient, Method};
pub use config::{ProbeConfig, Validate, ValidationResult};
pub use contract::{Contract, DataShape, StepOutcome, Verdict};
pub use harness::{ProbeHarness, RunOutcome};
pub use recorder::{Recorder, TestResult};
pub use report::ReportSummary;
pub use steps::{RunContext, Step, StepEnv};

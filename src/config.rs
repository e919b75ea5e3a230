//! Probe configuration.
//!
//! Values come from an optional TOML file, then `PROBE_*` environment
//! variables, then command-line flags. Every section has defaults that match
//! a local development backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::steps::Step;

/// Backend under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL every request path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value `data.status` must have in the health response.
    #[serde(default = "default_health_status")]
    pub expected_health_status: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_health_status() -> String {
    "ok".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            expected_health_status: default_health_status(),
        }
    }
}

/// Login used by the authentication step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_admin")]
    pub username: String,
    #[serde(default = "default_admin")]
    pub password: String,
}

fn default_admin() -> String {
    "admin".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username: default_admin(),
            password: default_admin(),
        }
    }
}

/// Upstream AI provider the backend is configured to proxy to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier known to the backend.
    #[serde(default = "default_provider")]
    pub name: String,
    /// Upstream API base URL (including the version prefix, e.g. `/v1`).
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Upstream API key.
    #[serde(default)]
    pub api_key: String,
    /// Model used for chat and workflow calls.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_provider() -> String {
    "zhipu".to_string()
}

fn default_provider_base_url() -> String {
    "http://localhost:39999/v1".to_string()
}

fn default_model() -> String {
    "glm-4.7".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            base_url: default_provider_base_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

/// Request timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Timeout for simple calls.
    #[serde(default = "default_request_timeout")]
    pub request_secs: u64,
    /// Timeout for calls that wait on an upstream chat completion.
    #[serde(default = "default_completion_timeout")]
    pub completion_secs: u64,
    /// Timeout for the streaming call.
    #[serde(default = "default_stream_timeout")]
    pub stream_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_completion_timeout() -> u64 {
    120
}

fn default_stream_timeout() -> u64 {
    60
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_timeout(),
            completion_secs: default_completion_timeout(),
            stream_secs: default_stream_timeout(),
        }
    }
}

impl TimeoutsConfig {
    /// Returns the simple-call timeout as a Duration.
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    /// Returns the completion timeout as a Duration.
    pub fn completion(&self) -> Duration {
        Duration::from_secs(self.completion_secs)
    }

    /// Returns the streaming timeout as a Duration.
    pub fn stream(&self) -> Duration {
        Duration::from_secs(self.stream_secs)
    }
}

/// Report output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the JSON report is written to.
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
    /// Whether to write the JSON report file at all.
    #[serde(default = "default_write_file")]
    pub write_file: bool,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_write_file() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            write_file: default_write_file(),
        }
    }
}

/// Step selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepsConfig {
    /// Steps left out of the run.
    #[serde(default)]
    pub skip: Vec<Step>,
}

/// Top-level probe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub steps: StepsConfig,
}

impl ProbeConfig {
    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(Error::Io)?;

        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Applies `PROBE_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `PROBE_*` overrides using the given lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("PROBE_BASE_URL") {
            self.target.base_url = v;
        }
        if let Some(v) = lookup("PROBE_USERNAME") {
            self.credentials.username = v;
        }
        if let Some(v) = lookup("PROBE_PASSWORD") {
            self.credentials.password = v;
        }
        if let Some(v) = lookup("PROBE_PROVIDER") {
            self.provider.name = v;
        }
        if let Some(v) = lookup("PROBE_PROVIDER_BASE_URL") {
            self.provider.base_url = v;
        }
        if let Some(v) = lookup("PROBE_PROVIDER_API_KEY") {
            self.provider.api_key = v;
        }
        if let Some(v) = lookup("PROBE_MODEL") {
            self.provider.model = v;
        }
        if let Some(v) = lookup("PROBE_REPORT_DIR") {
            self.report.dir = PathBuf::from(v);
        }
        self
    }

    /// Returns true if the step is part of this run.
    pub fn is_enabled(&self, step: Step) -> bool {
        step.is_mandatory() || !self.steps.skip.contains(&step)
    }
}

/// Validation result containing all found issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Fatal issues.
    pub errors: Vec<String>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Converts to a Result, failing if there are errors.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(Error::Config(self.errors.join("; ")))
        }
    }
}

/// Trait for validatable configuration types.
pub trait Validate {
    /// Validates the configuration and returns any issues found.
    fn validate(&self) -> ValidationResult;
}

impl Validate for ProbeConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        // Base URL must be an absolute http(s) URL
        match reqwest::Url::parse(&self.target.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => result.add_error(format!(
                "target.base_url must be http or https, got '{}'",
                url.scheme()
            )),
            Err(e) => result.add_error(format!(
                "target.base_url '{}' is not a valid URL: {}",
                self.target.base_url, e
            )),
        }

        // Login needs a username
        if self.credentials.username.trim().is_empty() {
            result.add_error("credentials.username cannot be empty");
        }

        // Provider name is sent with every AI call
        if self.provider.name.trim().is_empty() {
            result.add_error("provider.name cannot be empty");
        }

        // Zero would fail every request immediately
        if self.timeouts.request_secs == 0
            || self.timeouts.completion_secs == 0
            || self.timeouts.stream_secs == 0
        {
            result.add_error("timeouts must be at least 1 second");
        }

        if self.timeouts.completion_secs < self.timeouts.request_secs {
            result.add_warning("timeouts.completion_secs is shorter than timeouts.request_secs");
        }

        // Login and report always run
        if self.steps.skip.contains(&Step::Authenticate) {
            result.add_error("the authenticate step cannot be skipped; later steps need its token");
        }

        if self.steps.skip.contains(&Step::Report) {
            result.add_error("the report step cannot be skipped; set report.write_file = false instead");
        }

        let configures_provider = self.is_enabled(Step::ConfigureProvider);
        if configures_provider && self.provider.api_key.is_empty() {
            result.add_warning("provider.api_key is empty; the provider connection test will likely fail");
        }

        result
    }
}

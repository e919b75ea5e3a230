//! Backend probe CLI
//!
//! Drives a running backend through its API flows and writes a pass/fail report.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backend_probe::{HttpClient, ProbeConfig, ProbeHarness, Step, Validate};

/// Exit code for configuration and setup errors.
const SETUP_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "backend-probe", version, about = "End-to-end probe for the backend HTTP API")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the backend under test.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Directory the JSON report is written to.
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Print the summary without writing the JSON report.
    #[arg(long)]
    no_report_file: bool,

    /// Step to leave out of the run (repeatable).
    #[arg(long = "skip", value_name = "STEP")]
    skip: Vec<Step>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(cli: &Cli) -> backend_probe::Result<ProbeConfig> {
    let config = match &cli.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    let mut config = config.with_env_overrides();

    if let Some(base_url) = &cli.base_url {
        config.target.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.report_dir {
        config.report.dir = dir.clone();
    }
    if cli.no_report_file {
        config.report.write_file = false;
    }
    config.steps.skip.extend(cli.skip.iter().copied());

    for warning in config.validate().into_result()? {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Builds the log subscriber; `RUST_LOG` refines the level picked by `--verbose`.
fn log_subscriber<W>(verbose: bool, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(writer)
        .finish()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the console report
    log_subscriber(cli.verbose, std::io::stderr).init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(SETUP_ERROR);
        }
    };

    let client = match HttpClient::new(&config.target.base_url, config.timeouts.request()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(SETUP_ERROR);
        }
    };

    println!("{}", "=".repeat(40));
    println!("  Backend API probe");
    println!("{}", "=".repeat(40));
    println!("Backend:  {}", config.target.base_url);
    println!("Provider: {}", config.provider.name);
    println!("Model:    {}", config.provider.model);
    println!("{}", "=".repeat(40));

    let outcome = ProbeHarness::new(client, config).with_echo(true).run().await;

    ExitCode::from(outcome.exit_code())
}

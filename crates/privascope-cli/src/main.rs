//! Command-line entry point: one synchronous assessment, report printed to
//! stdout, diagnostics to stderr.
//!
//! Exit status: 0 on success, 1 when the pipeline aborts, 2 when the
//! process is misconfigured (no credential, bad duration override).

use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::debug;

use privascope_runtime::{AssessmentPipeline, AssessmentRequest, RuntimeConfig};

/// Exit status for startup configuration failures.
const CONFIG_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "privascope",
    version,
    about = "Assess a web-hosted privacy policy against a regulation principle"
)]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one assessment and print the report.
    Assess {
        /// URL of the privacy policy page
        #[arg(long)]
        url: String,

        /// Regulation the principle belongs to (e.g. "GDPR")
        #[arg(long)]
        regulation: String,

        /// Privacy principle to assess (e.g. "data minimization")
        #[arg(long)]
        principle: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Configuration and credential resolution happen once, up front; a
    // misconfigured process never starts a pipeline run.
    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(CONFIG_FAILURE);
        }
    };
    let pipeline = match AssessmentPipeline::standard(&config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(CONFIG_FAILURE);
        }
    };
    debug!(model = %config.model, "pipeline configured");

    let Commands::Assess {
        url,
        regulation,
        principle,
    } = cli.command;

    match pipeline
        .assess(AssessmentRequest {
            url,
            regulation,
            principle,
        })
        .await
    {
        Ok(report) => match print_report(&report, cli.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!(
                "assessment failed at stage '{}' ({} error): {}",
                err.stage,
                err.cause.kind(),
                err.cause
            );
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &privascope_core::Report, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(report).context("serializing report")?;
        println!("{rendered}");
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::PipelineConfig;
use model_releaser::ModelReleaser;

/// Exit code for an operational failure (training, backup, store, ...)
const EXIT_FAILED: u8 = 1;

/// Exit code for a run rejected by the accuracy gate
const EXIT_REJECTED: u8 = 2;

/// Input batch used for canary comparisons when no file is given
const DEFAULT_CANARY_BATCH: [[f64; 2]; 3] = [[0.1, -0.2], [1.0, 1.0], [-1.5, 0.3]];

#[derive(Parser)]
#[command(name = "model-releaser", about = "Gated release pipeline for ML model artifacts")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a candidate, evaluate the gate, promote or reject it
    Release {
        /// Override the configured epoch count for this run only
        #[arg(long)]
        epochs: Option<u32>,
    },

    /// Compare predictions of two served versions on the same inputs
    Canary {
        /// First version to compare
        #[arg(long)]
        version_a: u32,

        /// Second version to compare
        #[arg(long)]
        version_b: u32,

        /// JSON file with the input batch, `[[x1, x2], ...]`
        #[arg(long)]
        inputs: Option<PathBuf>,
    },

    /// List stored versions and the current one
    Versions,

    /// Query the model server's status for the configured model
    Status,

    /// Remove candidates that have metrics but no recorded decision
    Reconcile,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = PipelineConfig::load(&cli.config)?;
    let releaser = ModelReleaser::new(config)?;

    match cli.command {
        Command::Release { epochs } => {
            let record = releaser.run_release(epochs).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);

            if record.decision.is_promote() {
                Ok(ExitCode::SUCCESS)
            } else {
                // Rejected by the gate: an expected outcome, but still
                // distinguishable from an operational failure
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        }

        Command::Canary {
            version_a,
            version_b,
            inputs,
        } => {
            let batch: Vec<Vec<f64>> = match inputs {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("cannot read inputs file {:?}", path))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("malformed inputs file {:?}", path))?
                }
                None => DEFAULT_CANARY_BATCH.iter().map(|row| row.to_vec()).collect(),
            };

            let report = releaser.run_canary(version_a, version_b, &batch).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Versions => {
            let (versions, current) = releaser.list_versions()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "versions": versions,
                    "current": current,
                }))?
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Status => {
            let status = releaser.model_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Reconcile => {
            let removed = releaser.reconcile()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "removed": removed,
                }))?
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

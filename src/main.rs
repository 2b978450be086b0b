//! Event Chain CLI
//!
//! Runs the built-in reader → summary chain over one window of a dataset.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_chain::{resolve, run_job, Config, EventSource, JsonLinesDataset};

#[derive(Parser)]
#[command(name = "event-chain")]
#[command(about = "Run a per-event stage pipeline over a window of a dataset", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the input dataset path
    #[arg(short, long, global = true)]
    input: Option<String>,

    /// Override the job index (-1 = not splitting)
    #[arg(long, global = true, allow_negative_numbers = true)]
    job_index: Option<i64>,

    /// Override the per-job quota (-1 = all events, -2 = unbounded)
    #[arg(long, global = true, allow_negative_numbers = true)]
    quota: Option<i64>,

    /// Override payload parsing in the reader stage
    #[arg(long, global = true)]
    read_events: Option<bool>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline (default if no command specified)
    Run,

    /// Resolve and print the event window without processing
    Resolve,

    /// Validate configuration
    Validate,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        return generate_config_command(output);
    }

    let config = load_config(&cli)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.logging.filter_directives()))?)
        .init();

    match cli.command {
        None | Some(Commands::Run) => run_command(&config),
        Some(Commands::Resolve) => resolve_command(&config),
        Some(Commands::Validate) => validate_command(&config),
        Some(Commands::GenerateConfig { .. }) => Ok(()),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Apply overrides
    if let Some(input) = &cli.input {
        config.input.path = Some(input.clone());
    }
    if let Some(job_index) = cli.job_index {
        config.job.index = job_index;
    }
    if let Some(quota) = cli.quota {
        config.job.quota = quota;
    }
    if let Some(read_events) = cli.read_events {
        config.processing.read_events = read_events;
    }

    Ok(config)
}

fn run_command(config: &Config) -> Result<()> {
    let report = run_job(config)?;
    if report.statistics.events_failed > 0 {
        tracing::warn!(
            "{} of {} events failed",
            report.statistics.events_failed,
            report.statistics.events_visited()
        );
    }
    Ok(())
}

fn resolve_command(config: &Config) -> Result<()> {
    config.validate()?;
    let dataset = JsonLinesDataset::open(config.input_path()?)?;
    let total = dataset.event_count()?;
    let window = resolve(total, config.job.request());

    println!("\n=== Window ===");
    println!("Input: {}", dataset.identifier());
    println!("Events in dataset: {}", total);
    println!("Job index: {}", config.job.index);
    println!("Quota: {}", config.job.quota);
    println!("Window: {}", window);
    println!("Events to process: {}", window.len(total));
    println!(
        "Output artifact: {}",
        config.output.artifact_path(dataset.identifier()).display()
    );
    println!("==============\n");
    Ok(())
}

fn validate_command(config: &Config) -> Result<()> {
    config.validate()?;
    println!("Configuration is valid");
    Ok(())
}

fn generate_config_command(output: &Path) -> Result<()> {
    let yaml = r#"# Event Chain Configuration

# === INPUT: Line-delimited JSON events, one per line ===
input:
  path: "st_fwd_23074018_raw_4500027.events.jsonl"

# === JOB: Which slice of the dataset this run processes ===
job:
  # Job index; -1 processes from the start of the dataset
  index: -1

  # Events per job. Without a job index this caps the events processed.
  # -1 processes all events, -2 requests an unbounded stop.
  quota: 10

# === OUTPUT: Summary artifact ===
output:
  directory: "."

  # {token} is replaced by the characters after the last '_' of the input path
  name_template: "EventSummary_{token}.json"
  token_width: 7

# === PROCESSING ===
processing:
  # Parse event payloads in the reader stage
  read_events: true

  # Log progress every N events (0 disables)
  progress_interval: 0

  # Print per-stage timing after the run
  print_summary: false

  # Save run statistics as JSON
  # metrics_output_path: "run_metrics.json"

# === LOGGING: Severity limits (RUST_LOG overrides these) ===
logging:
  level: "info"
  directives: []
"#;

    std::fs::write(output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_default() {
        // No subcommand - should default to Run
        let cli = Cli::try_parse_from(["event-chain"]);
        assert!(cli.is_ok());
        assert!(cli.unwrap().command.is_none());
    }

    #[test]
    fn test_cli_parse_negative_overrides() {
        let cli = Cli::try_parse_from([
            "event-chain",
            "run",
            "--input",
            "run_0000001.jsonl",
            "--job-index",
            "-1",
            "--quota",
            "-2",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.job.index, -1);
        assert_eq!(config.job.quota, -2);
        assert_eq!(config.input.path.as_deref(), Some("run_0000001.jsonl"));
    }

    #[test]
    fn test_cli_parse_read_events_flag() {
        let cli = Cli::try_parse_from(["event-chain", "--read-events", "false", "validate"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert!(!config.processing.read_events);
    }

    #[test]
    fn test_generated_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        generate_config_command(&path).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.job.quota, 10);
        assert!(config.validate().is_ok());
    }
}

//! Configuration for an event-chain run.

use crate::io::TOKEN_PLACEHOLDER;
use crate::window::{WindowRequest, ALL_EVENTS, NOT_SPLIT, UNBOUNDED_QUOTA};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input configuration
    #[serde(default)]
    pub input: InputConfig,

    /// Job-splitting configuration
    #[serde(default)]
    pub job: JobConfig,

    /// Output artifact configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Log filtering
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input dataset configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the line-delimited JSON event file
    #[serde(default)]
    pub path: Option<String>,
}

/// Which slice of the dataset this run processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job index (-1 = not a split job)
    #[serde(default = "default_job_index")]
    pub index: i64,

    /// Events per job; without a job index a cap on events processed.
    /// -1 processes everything, -2 requests an unbounded stop.
    #[serde(default = "default_quota")]
    pub quota: i64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            index: NOT_SPLIT,
            quota: ALL_EVENTS,
        }
    }
}

impl JobConfig {
    pub fn request(&self) -> WindowRequest {
        WindowRequest::new(self.index, self.quota)
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the artifact is written to
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File name template; `{token}` is replaced by the input's iteration number
    #[serde(default = "default_name_template")]
    pub name_template: String,

    /// Characters taken after the last `_` of the input path
    #[serde(default = "default_token_width")]
    pub token_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            name_template: default_name_template(),
            token_width: default_token_width(),
        }
    }
}

impl OutputConfig {
    /// Full artifact path for the given input identifier.
    pub fn artifact_path(&self, input: &str) -> PathBuf {
        let name = crate::io::output_name(input, &self.name_template, self.token_width);
        Path::new(&self.directory).join(name)
    }
}

/// Processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Parse event payloads in the reader stage
    #[serde(default = "default_true")]
    pub read_events: bool,

    /// Log progress every N events (0 disables)
    #[serde(default)]
    pub progress_interval: u64,

    /// Print the per-stage breakdown after the run
    #[serde(default)]
    pub print_summary: bool,

    /// Optional path to save run statistics JSON after the run
    #[serde(default)]
    pub metrics_output_path: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            read_events: true,
            progress_interval: 0,
            print_summary: false,
            metrics_output_path: None,
        }
    }
}

/// Log filtering limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Extra `EnvFilter` directives, e.g. `event_chain::stages=warn`
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            // YAML is a superset of JSON
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Input path, which must be set before running.
    pub fn input_path(&self) -> anyhow::Result<&str> {
        self.input
            .path
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No input path configured"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.input.path.as_deref() {
            None | Some("") => anyhow::bail!("Input path must be set"),
            _ => {}
        }

        if self.job.index < NOT_SPLIT {
            anyhow::bail!("Job index must be >= -1, got {}", self.job.index);
        }
        if self.job.index >= 0 && self.job.quota <= 0 {
            anyhow::bail!(
                "Job splitting needs a positive quota, got {}",
                self.job.quota
            );
        }
        if self.job.quota < UNBOUNDED_QUOTA {
            anyhow::bail!("Quota must be >= -2, got {}", self.job.quota);
        }

        if !self.output.name_template.contains(TOKEN_PLACEHOLDER) {
            anyhow::bail!(
                "Output name template must contain {}",
                TOKEN_PLACEHOLDER
            );
        }
        if self.output.token_width == 0 {
            anyhow::bail!("Token width must be > 0");
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            anyhow::bail!("Unknown log level {:?}", self.logging.level);
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_job_index() -> i64 { NOT_SPLIT }
fn default_quota() -> i64 { ALL_EVENTS }
fn default_output_directory() -> String { ".".to_string() }
fn default_name_template() -> String { "EventSummary_{token}.json".to_string() }
fn default_token_width() -> usize { 7 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }

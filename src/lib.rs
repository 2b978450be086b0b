//! Event Chain
//!
//! Batch driver for per-event processing pipelines. A run selects a
//! contiguous window of events from a dataset (so one dataset can be split
//! across many parallel jobs), pushes each event through an ordered sequence
//! of stages, and reports the wall-clock time of the event loop.
//!
//! # Architecture
//!
//! - **Window**: job-split event range resolution
//! - **Pipeline**: the [`Stage`] lifecycle, the ordered stage chain and the
//!   sequential orchestrator
//! - **I/O**: datasets and output artifact naming
//! - **Stages**: a JSON-lines reader and a summary writer
//!
//! # Usage
//!
//! ```no_run
//! use event_chain::{run_job, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml".as_ref())?;
//!     run_job(&config)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod stages;
pub mod window;


pub use config::Config;
pub use error::{RunError, StageFailure};
pub use io::{EventSource, JsonLinesDataset};
pub use pipeline::{
    Orchestrator, OrchestratorConfig, Pipeline, RunStatistics, Stage, StageStatus,
};
pub use window::{resolve, ResolvedWindow, WindowRequest};

use std::path::PathBuf;
use std::rc::Rc;

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Total events in the dataset
    pub total_events: u64,

    /// Window resolved for this run
    pub window: ResolvedWindow,

    /// Event-loop statistics
    pub statistics: RunStatistics,
}

/// Run `pipeline` over the window `request` selects from `source`.
///
/// This is the core entry point: stages are supplied by the caller. When no
/// events remain for the job the pipeline still initializes and finalizes
/// over an empty window.
pub fn run_pipeline(
    source: &dyn EventSource,
    request: WindowRequest,
    pipeline: &mut Pipeline,
    config: OrchestratorConfig,
) -> Result<RunReport, RunError> {
    let total_events = source.event_count().map_err(|source_err| RunError::Dataset {
        path: source.identifier().to_string(),
        source: source_err,
    })?;
    tracing::info!("Found {} entries in {}", total_events, source.identifier());

    let window = resolve(total_events, request);

    let span = tracing::info_span!(
        "run",
        input = source.identifier(),
        job = request.job_index,
    );
    let mut orchestrator = Orchestrator::new(config, span);
    let statistics = orchestrator.run(pipeline, window.events(total_events))?;

    Ok(RunReport {
        total_events,
        window,
        statistics,
    })
}

/// Build the built-in reader → summary chain for `dataset`.
pub fn build_pipeline(config: &Config, dataset: Rc<JsonLinesDataset>) -> (Pipeline, PathBuf) {
    let output_path = config.output.artifact_path(dataset.identifier());
    let slot = stages::event_slot();

    let reader = stages::EventReader::new(
        dataset.clone(),
        slot.clone(),
        config.processing.read_events,
    );
    let summary = stages::EventSummary::new(slot, dataset.identifier(), output_path.clone());

    (
        Pipeline::new(vec![Box::new(reader), Box::new(summary)]),
        output_path,
    )
}

/// Run the built-in chain described by `config`.
pub fn run_job(config: &Config) -> anyhow::Result<RunReport> {
    config.validate()?;
    let input = config.input_path()?;

    tracing::info!("Starting event chain on {}", input);
    let dataset = JsonLinesDataset::open(input).map_err(|source| RunError::Dataset {
        path: input.to_string(),
        source,
    })?;
    let dataset = Rc::new(dataset);

    let (mut pipeline, output_path) = build_pipeline(config, dataset.clone());
    tracing::info!("Output artifact: {}", output_path.display());

    let orchestrator_config = OrchestratorConfig {
        progress_interval: config.processing.progress_interval,
        print_summary: config.processing.print_summary,
        metrics_output_path: config.processing.metrics_output_path.clone(),
    };

    let report = run_pipeline(
        dataset.as_ref(),
        config.job.request(),
        &mut pipeline,
        orchestrator_config,
    )?;

    Ok(report)
}

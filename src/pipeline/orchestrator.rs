//! Drives a [`Pipeline`] through its lifecycle for one event window.
//!
//! ```text
//! Created ──▶ Initialized ──▶ Running ──▶ Finalized ──▶ Terminal
//!    │                        (per event)
//!    └── initialize failure ──────────────────────────▶ Terminal
//! ```
//!
//! Once a run reaches `Initialized` it always passes through `Finalized`.

use crate::error::RunError;
use crate::pipeline::{EventOutcome, Metrics, Pipeline, RunStatistics};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Initialized,
    Running { event: u64 },
    Finalized,
    Terminal,
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Log progress every N events (0 disables)
    pub progress_interval: u64,

    /// Print the stage breakdown after the timing report
    pub print_summary: bool,

    /// Optional path to save run statistics as JSON
    pub metrics_output_path: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_interval: 0,
            print_summary: false,
            metrics_output_path: None,
        }
    }
}

/// Sequential event-loop driver.
pub struct Orchestrator {
    config: OrchestratorConfig,
    span: tracing::Span,
    metrics: Arc<Metrics>,
    state: RunState,
}

impl Orchestrator {
    /// Create an orchestrator logging under `span`.
    pub fn new(config: OrchestratorConfig, span: tracing::Span) -> Self {
        Self {
            config,
            span,
            metrics: Metrics::new(),
            state: RunState::Created,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Counters of the current (or last) run.
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Run `pipeline` over every event index in `events`.
    ///
    /// Every event in `events` is visited. Per-event failures, panics
    /// included, are logged and counted; only initialization and
    /// finalization failures come back as errors.
    pub fn run(
        &mut self,
        pipeline: &mut Pipeline,
        events: Range<u64>,
    ) -> Result<RunStatistics, RunError> {
        let span = self.span.clone();
        let _entered = span.enter();

        self.metrics = Metrics::new();
        self.state = RunState::Created;

        if let Err(err) = pipeline.initialize_all() {
            tracing::error!("{}", err);
            self.state = RunState::Terminal;
            return Err(err);
        }
        self.state = RunState::Initialized;
        tracing::info!(stages = pipeline.len(), "Pipeline initialized");

        let clock = Instant::now();
        for event in events.clone() {
            self.state = RunState::Running { event };

            match pipeline.run_unit(event) {
                EventOutcome::Processed => self.metrics.add_event_processed(),
                EventOutcome::Skipped { stage } => {
                    tracing::debug!(event, stage = %stage, "Event skipped");
                    self.metrics.add_event_skipped();
                }
                EventOutcome::Failed(failure) => {
                    tracing::warn!(event, "{}", failure);
                    self.metrics.add_event_failed();
                }
            }

            let visited = event - events.start + 1;
            if self.config.progress_interval > 0 && visited % self.config.progress_interval == 0 {
                let total = events.end - events.start;
                tracing::info!(
                    "[{:.1}%] {} of {} events",
                    visited as f64 / total as f64 * 100.0,
                    visited,
                    total
                );
            }
        }
        let elapsed = clock.elapsed();

        let finalized = pipeline.finalize_all();
        self.state = RunState::Finalized;

        if let Err(failures) = &finalized {
            for _ in failures {
                self.metrics.add_finalize_failure();
            }
        }

        let stats = self.metrics.snapshot(elapsed, pipeline.stage_times());
        self.report(&stats);
        self.state = RunState::Terminal;

        match finalized {
            Ok(()) => Ok(stats),
            Err(failures) => Err(RunError::Finalization {
                failures,
                statistics: Box::new(stats),
            }),
        }
    }

    fn report(&self, stats: &RunStatistics) {
        tracing::info!("Run complete: {}", stats);
        stats.print_timing();

        if self.config.print_summary {
            stats.print_summary();
        }
        if let Some(ref path) = self.config.metrics_output_path {
            if let Err(e) = stats.save_to_file(path) {
                tracing::warn!("Failed to save metrics to {}: {}", path, e);
            }
        }
    }
}

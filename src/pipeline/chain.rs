//! Ordered stage sequence and its lifecycle.
//!
//! ```text
//! ┌──────────┐     ┌──────────┐           ┌──────────┐
//! │ Stage 0  │────▶│ Stage 1  │──── … ───▶│ Stage N  │   process(i)
//! └──────────┘     └──────────┘           └──────────┘
//!        reset() on every stage after each event, whatever happened
//! ```
//!
//! Stages run strictly in sequence order: stage N for event i completes
//! before stage N+1 sees it, and event i completes before event i+1 starts.

use crate::error::{RunError, StageFailure};
use crate::pipeline::{Stage, StageStatus, StageTime};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Result of pushing one event through the pipeline.
#[derive(Debug)]
pub enum EventOutcome {
    /// Every stage returned `Continue`
    Processed,

    /// A stage dropped the event
    Skipped { stage: String },

    /// A stage failed; later stages did not see the event
    Failed(StageFailure),
}

/// Ordered, fixed-at-construction sequence of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    stage_times: Vec<Duration>,
}

impl Pipeline {
    /// Create a pipeline from stages in execution order.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let stage_times = vec![Duration::ZERO; stages.len()];
        Self {
            stages,
            stage_times,
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Initialize every stage in order. The first failure aborts.
    pub fn initialize_all(&mut self) -> Result<(), RunError> {
        for stage in &mut self.stages {
            tracing::debug!(stage = stage.name(), "Initializing stage");
            stage
                .initialize()
                .map_err(|source| RunError::Initialization {
                    stage: stage.name().to_string(),
                    source,
                })?;
        }
        self.stage_times.iter_mut().for_each(|t| *t = Duration::ZERO);
        Ok(())
    }

    /// Push one event through the stages in order.
    ///
    /// A stage that panics is reported as a failure of this event.
    /// Prefer [`Pipeline::run_unit`], which also resets per-event state.
    pub fn process_unit(&mut self, event: u64) -> EventOutcome {
        for (stage, time) in self.stages.iter_mut().zip(self.stage_times.iter_mut()) {
            let started = Instant::now();
            let result = catch_unwind(AssertUnwindSafe(|| stage.process(event)))
                .unwrap_or_else(|payload| Err(panic_error(payload)));
            *time += started.elapsed();

            match result {
                Ok(StageStatus::Continue) => {}
                Ok(StageStatus::SkipEvent) => {
                    return EventOutcome::Skipped {
                        stage: stage.name().to_string(),
                    };
                }
                Err(error) => {
                    return EventOutcome::Failed(StageFailure::new(
                        stage.name(),
                        Some(event),
                        error,
                    ));
                }
            }
        }
        EventOutcome::Processed
    }

    /// Clear per-event state on every stage.
    pub fn reset_unit(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Process one event, then reset per-event state on every stage.
    pub fn run_unit(&mut self, event: u64) -> EventOutcome {
        let outcome = self.process_unit(event);
        self.reset_unit();
        outcome
    }

    /// Finalize every stage in order, continuing past failures.
    pub fn finalize_all(&mut self) -> Result<(), Vec<StageFailure>> {
        let mut failures = Vec::new();
        for stage in &mut self.stages {
            tracing::debug!(stage = stage.name(), "Finalizing stage");
            if let Err(error) = stage.finalize() {
                tracing::error!(stage = stage.name(), "Finalize failed: {:#}", error);
                failures.push(StageFailure::new(stage.name(), None, error));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Cumulative `process` time per stage since the last initialize.
    pub fn stage_times(&self) -> Vec<StageTime> {
        self.stages
            .iter()
            .zip(&self.stage_times)
            .map(|(stage, time)| StageTime {
                stage: stage.name().to_string(),
                secs: time.as_secs_f64(),
            })
            .collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    anyhow::anyhow!("panicked: {}", message)
}

//! The lifecycle contract every processing stage implements.

use anyhow::Result;

/// What a stage wants to happen after it processed an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Hand the event on to the next stage
    Continue,

    /// Drop this event; later stages do not see it. Not a failure.
    SkipEvent,
}

/// One step of the processing pipeline.
///
/// Stages are opaque to the orchestrator beyond this lifecycle. Data shared
/// between stages for the same event is managed by the stages themselves.
pub trait Stage {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Called once before the first event. Any error aborts the run.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Process one event. An error or a panic fails only this event.
    fn process(&mut self, event: u64) -> Result<StageStatus>;

    /// Drop per-event scratch state. Runs after every event, whatever the
    /// outcome of [`Stage::process`].
    fn reset(&mut self) {}

    /// Called once at the end of the run, even when events failed.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

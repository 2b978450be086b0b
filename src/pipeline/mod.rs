//! Sequential stage pipeline and the event-loop orchestrator.

mod chain;
mod metrics;
mod orchestrator;
mod stage;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{EventOutcome, Pipeline};
pub use metrics::{Metrics, RunStatistics, StageTime, SEPARATOR};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunState};
pub use stage::{Stage, StageStatus};

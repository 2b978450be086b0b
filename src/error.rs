//! Errors surfaced by a pipeline run.

use crate::pipeline::RunStatistics;
use std::fmt;
use thiserror::Error;

/// A stage failure, tagged with the stage and (for per-event failures) the
/// event index it happened on.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub event: Option<u64>,
    pub error: anyhow::Error,
}

impl StageFailure {
    pub fn new(stage: impl Into<String>, event: Option<u64>, error: anyhow::Error) -> Self {
        Self {
            stage: stage.into(),
            event,
            error,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            Some(event) => write!(f, "{} failed on event {}: {:#}", self.stage, event, self.error),
            None => write!(f, "{}: {:#}", self.stage, self.error),
        }
    }
}

/// Run-aborting errors.
///
/// Per-event failures never show up here; they are logged and counted in
/// [`RunStatistics`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("dataset {path} could not be read: {source:#}")]
    Dataset {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("stage {stage} failed to initialize: {source:#}")]
    Initialization {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} stage(s) failed to finalize: {}", .failures.len(), join_failures(.failures))]
    Finalization {
        failures: Vec<StageFailure>,
        statistics: Box<RunStatistics>,
    },
}

impl RunError {
    /// Whether the run was aborted before any event was processed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, RunError::Dataset { .. } | RunError::Initialization { .. })
    }

    /// Statistics of the completed event loop, if it ran.
    pub fn statistics(&self) -> Option<&RunStatistics> {
        match self {
            RunError::Finalization { statistics, .. } => Some(statistics),
            _ => None,
        }
    }
}

fn join_failures(failures: &[StageFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

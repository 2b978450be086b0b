//! Event datasets.
//!
//! The core only ever asks a dataset for its event count; reading individual
//! events is up to the stages wired around it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A bounded input dataset.
pub trait EventSource {
    /// Identifier used for diagnostics and output naming.
    fn identifier(&self) -> &str;

    /// Total number of events, known before processing begins.
    fn event_count(&self) -> Result<u64>;
}

/// Line-delimited JSON file, one event per line.
///
/// Blank lines still count as events; readers decide what to do with them.
#[derive(Debug)]
pub struct JsonLinesDataset {
    path: PathBuf,
    identifier: String,
    lines: Vec<String>,
}

impl JsonLinesDataset {
    /// Load the whole file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let lines = contents.lines().map(str::to_string).collect();
        Ok(Self {
            identifier: path.to_string_lossy().into_owned(),
            path,
            lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Parse the event at `index`.
    ///
    /// Returns `Ok(None)` for past-the-end indices and blank lines.
    pub fn record(&self, index: u64) -> Result<Option<serde_json::Value>> {
        let Some(line) = usize::try_from(index).ok().and_then(|i| self.lines.get(i)) else {
            return Ok(None);
        };
        if line.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(line)
            .with_context(|| format!("event {} is not valid JSON", index))?;
        Ok(Some(value))
    }

    /// Whether `index` addresses an event in this dataset.
    pub fn contains(&self, index: u64) -> bool {
        index < self.lines.len() as u64
    }
}

impl EventSource for JsonLinesDataset {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn event_count(&self) -> Result<u64> {
        Ok(self.lines.len() as u64)
    }
}

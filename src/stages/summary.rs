//! Accumulates per-field statistics across events and writes them out at the
//! end of the run.

use super::EventSlot;
use crate::pipeline::{Stage, StageStatus};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Running statistics of one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl FieldSummary {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Contents of the summary artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub input: String,
    pub events: u64,
    pub first_event: Option<u64>,
    pub last_event: Option<u64>,
    /// Numeric top-level fields seen in event payloads
    pub fields: BTreeMap<String, FieldSummary>,
}

/// Terminal stage of the built-in chain.
pub struct EventSummary {
    slot: EventSlot,
    output_path: PathBuf,
    report: SummaryReport,
}

impl EventSummary {
    pub fn new(slot: EventSlot, input: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            slot,
            output_path: output_path.into(),
            report: SummaryReport {
                input: input.into(),
                ..Default::default()
            },
        }
    }

    pub fn report(&self) -> &SummaryReport {
        &self.report
    }
}

impl Stage for EventSummary {
    fn name(&self) -> &str {
        "summary"
    }

    fn initialize(&mut self) -> Result<()> {
        self.report = SummaryReport {
            input: std::mem::take(&mut self.report.input),
            ..Default::default()
        };
        Ok(())
    }

    fn process(&mut self, event: u64) -> Result<StageStatus> {
        let slot = self.slot.borrow();
        let loaded = slot
            .as_ref()
            .with_context(|| format!("no event loaded for index {}", event))?;

        if let Some(last) = self.report.last_event {
            anyhow::ensure!(
                loaded.index > last,
                "event {} arrived after event {}",
                loaded.index,
                last
            );
        }

        if let Some(serde_json::Value::Object(fields)) = &loaded.record {
            for (name, value) in fields {
                if let Some(value) = value.as_f64() {
                    self.report
                        .fields
                        .entry(name.clone())
                        .and_modify(|f| f.add(value))
                        .or_insert_with(|| FieldSummary::new(value));
                }
            }
        }

        self.report.events += 1;
        self.report.first_event.get_or_insert(loaded.index);
        self.report.last_event = Some(loaded.index);
        Ok(StageStatus::Continue)
    }

    fn finalize(&mut self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.report)?;
        std::fs::write(&self.output_path, json)
            .with_context(|| format!("failed to write {}", self.output_path.display()))?;
        tracing::info!(
            events = self.report.events,
            "Summary written to {}",
            self.output_path.display()
        );
        Ok(())
    }
}

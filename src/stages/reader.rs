//! Loads events from the dataset into the shared slot.

use super::{EventSlot, LoadedEvent};
use crate::io::JsonLinesDataset;
use crate::pipeline::{Stage, StageStatus};
use anyhow::Result;
use std::rc::Rc;

/// First stage of the built-in chain.
pub struct EventReader {
    dataset: Rc<JsonLinesDataset>,
    slot: EventSlot,
    read_events: bool,
}

impl EventReader {
    /// `read_events` toggles payload parsing. With it off, only the event
    /// index is published.
    pub fn new(dataset: Rc<JsonLinesDataset>, slot: EventSlot, read_events: bool) -> Self {
        Self {
            dataset,
            slot,
            read_events,
        }
    }
}

impl Stage for EventReader {
    fn name(&self) -> &str {
        "reader"
    }

    fn initialize(&mut self) -> Result<()> {
        tracing::debug!(
            path = %self.dataset.path().display(),
            read_events = self.read_events,
            "Reader ready"
        );
        Ok(())
    }

    fn process(&mut self, event: u64) -> Result<StageStatus> {
        if !self.dataset.contains(event) {
            anyhow::bail!(
                "event {} is past the end of {} ({} events)",
                event,
                self.dataset.path().display(),
                self.dataset.len()
            );
        }

        let record = if self.read_events {
            match self.dataset.record(event)? {
                Some(record) => Some(record),
                // blank line
                None => return Ok(StageStatus::SkipEvent),
            }
        } else {
            None
        };

        *self.slot.borrow_mut() = Some(LoadedEvent { index: event, record });
        Ok(StageStatus::Continue)
    }

    fn reset(&mut self) {
        self.slot.borrow_mut().take();
    }
}

//! Built-in stages wired around a [`JsonLinesDataset`](crate::io::JsonLinesDataset).
//!
//! The reader loads event `i` into a shared [`EventSlot`]; later stages read
//! it from there. The slot is cleared when the pipeline resets the event.

mod reader;
mod summary;

pub use reader::EventReader;
pub use summary::{EventSummary, SummaryReport};

use std::cell::RefCell;
use std::rc::Rc;

/// The event currently loaded by the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEvent {
    pub index: u64,
    /// Parsed payload; `None` when payloads are not read
    pub record: Option<serde_json::Value>,
}

/// Per-event slot shared between stages.
pub type EventSlot = Rc<RefCell<Option<LoadedEvent>>>;

/// Create an empty event slot.
pub fn event_slot() -> EventSlot {
    Rc::new(RefCell::new(None))
}

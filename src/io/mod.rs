//! Dataset access and output naming.

mod dataset;
mod naming;

pub use dataset::{EventSource, JsonLinesDataset};
pub use naming::{iteration_token, output_name, TOKEN_PLACEHOLDER};

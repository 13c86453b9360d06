//! Knowledge module - Chunks of reference text used to ground generation.

mod chunk;
mod splitter;

pub use chunk::{DocumentChunk, RetrievedChunk};
pub use splitter::TextSplitter;

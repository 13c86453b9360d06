//! Generation module - Prompt composition and model output validation.
//!
//! Pure domain logic: nothing here performs I/O. The application layer
//! feeds these pieces with retrieved context and model responses.

mod composer;
mod errors;
mod formatter;
mod parser;
pub mod prompts;

pub use composer::{Prompt, PromptComposer};
pub use errors::SchemaViolation;
pub use formatter::{epic_groups, format_epics, format_requirements, normalize_ids, STORY_GROUP_SIZE};
pub use parser::{extract_json, ResponseParser};

//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `artifacts` - Requirements, epics, user stories and the response envelope
//! - `session` - Conversation sessions and their append-only turn log
//! - `knowledge` - Reference text chunks and the text splitter
//! - `generation` - Prompt composition and model output validation

pub mod artifacts;
pub mod foundation;
pub mod generation;
pub mod knowledge;
pub mod session;

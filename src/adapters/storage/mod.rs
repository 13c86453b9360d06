//! Storage Adapters
//!
//! Implementations of the SessionRepository port.
//!
//! ## Available Adapters
//!
//! - **FileSessionRepository** - Stores each session as a YAML file on disk
//! - **InMemorySessionRepository** - Stores sessions in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionRepository, InMemorySessionRepository};
//!
//! // Production: file-based storage
//! let repo = FileSessionRepository::new("./data/sessions");
//!
//! // Testing: in-memory storage
//! let repo = InMemorySessionRepository::new();
//! ```

mod file_session_repository;
mod in_memory_session_repository;

pub use file_session_repository::FileSessionRepository;
pub use in_memory_session_repository::InMemorySessionRepository;

//! Artifacts module - Requirements, epics and user stories.
//!
//! Typed forms of everything the generation pipeline produces, plus the
//! envelope that carries a batch back to the caller.

mod envelope;
mod epic;
mod requirement;
mod schema;
mod user_story;

pub use envelope::{ArtifactContent, ArtifactEnvelope, Artifacts, ResponseStatus};
pub use epic::{Epic, RelatedRequirement};
pub use requirement::{Priority, Requirement, RequirementCategory};
pub use schema::{Language, TargetSchema};
pub use user_story::{Narrative, UserStory};

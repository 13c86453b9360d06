//! Errors raised while interpreting model output.

use thiserror::Error;

use crate::domain::artifacts::TargetSchema;

/// The model answered, but the answer cannot be used for the requested schema.
///
/// Raised by the response parser for missing or malformed JSON, missing or
/// blank required fields, unknown enumerated values and colliding ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model output violates the {schema} schema: {reason}")]
pub struct SchemaViolation {
    pub schema: TargetSchema,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(schema: TargetSchema, reason: impl Into<String>) -> Self {
        Self {
            schema,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_schema_and_reason() {
        let err = SchemaViolation::new(TargetSchema::UserStories, "item 0: missing required field 'title'");
        assert_eq!(
            err.to_string(),
            "model output violates the user_stories schema: item 0: missing required field 'title'"
        );
    }
}

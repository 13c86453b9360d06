//! Response parser and validator.
//!
//! Turns raw model text into a typed [`ArtifactEnvelope`] for the requested
//! schema. The whole batch is rejected on the first violation; no partial
//! results are returned.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::SchemaViolation;
use crate::domain::artifacts::{
    ArtifactEnvelope, Artifacts, Epic, Priority, RelatedRequirement, Requirement,
    RequirementCategory, ResponseStatus, TargetSchema, UserStory,
};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));

/// Locates the JSON payload inside model output.
///
/// Output that is already valid JSON is taken as is. Otherwise a fenced code
/// block wins, then the first balanced `{...}` or `[...]`, whichever opens
/// first.
pub fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok()
        && (trimmed.starts_with('{') || trimmed.starts_with('['))
    {
        return Some(trimmed);
    }

    if let Some(caps) = FENCED_JSON.captures(raw) {
        if let Some(body) = caps.get(1) {
            let body = body.as_str().trim();
            if body.starts_with('{') || body.starts_with('[') {
                return Some(body);
            }
        }
    }

    let start = raw.find(|c: char| c == '{' || c == '[')?;
    balanced_end(&raw[start..]).map(|end| &raw[start..start + end])
}

/// Byte length of the bracketed value opening `text`, skipping brackets
/// inside string literals. `None` if it never closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses and validates model output.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses `raw` as an envelope for `schema`.
    ///
    /// The returned envelope has an empty `query`; the caller fills it in.
    pub fn parse(&self, raw: &str, schema: TargetSchema) -> Result<ArtifactEnvelope, SchemaViolation> {
        let json = extract_json(raw)
            .ok_or_else(|| SchemaViolation::new(schema, "no JSON object found in model output"))?;

        let value: Value = serde_json::from_str(json)
            .map_err(|e| SchemaViolation::new(schema, format!("malformed JSON: {}", e)))?;

        match value {
            Value::Array(items) => {
                let artifacts = parse_artifacts(items, schema)?;
                Ok(ArtifactEnvelope::with_artifacts("", artifacts))
            }
            Value::Object(map) => parse_object(map, schema),
            _ => Err(SchemaViolation::new(
                schema,
                "expected a JSON object or array at the top level",
            )),
        }
    }
}

fn parse_object(mut map: Map<String, Value>, schema: TargetSchema) -> Result<ArtifactEnvelope, SchemaViolation> {
    let content = map.remove("content").unwrap_or(Value::Null);

    let status = match map.get("status") {
        Some(Value::String(label)) => ResponseStatus::parse_label(label).ok_or_else(|| {
            SchemaViolation::new(schema, format!("unknown status '{}'", label))
        })?,
        Some(Value::Null) | None => match &content {
            Value::Array(_) => ResponseStatus::generated_for(schema),
            Value::String(text) if !text.trim().is_empty() => ResponseStatus::GeneralResponse,
            _ => {
                return Err(SchemaViolation::new(
                    schema,
                    "missing status and no artifact list or text content",
                ))
            }
        },
        Some(_) => return Err(SchemaViolation::new(schema, "status must be a string")),
    };

    let mut envelope = if status.carries_artifacts() {
        let expected = ResponseStatus::generated_for(schema);
        if status != expected {
            return Err(SchemaViolation::new(
                schema,
                format!("status {} does not match requested {}", status, expected),
            ));
        }
        let items = artifact_list(content, schema)?;
        ArtifactEnvelope::with_artifacts("", parse_artifacts(items, schema)?)
    } else {
        let text = match content {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        ArtifactEnvelope::with_text(status, "", text)
    };

    envelope.missing_info = missing_info(map.remove("missing_info"));
    envelope.metadata = match map.remove("metadata") {
        Some(Value::Null) | None => None,
        Some(meta) => Some(meta),
    };
    Ok(envelope)
}

/// Accepts a bare list or an object wrapping one list, e.g. `{"requirements": [...]}`.
fn artifact_list(content: Value, schema: TargetSchema) -> Result<Vec<Value>, SchemaViolation> {
    match content {
        Value::Array(items) => Ok(items),
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| SchemaViolation::new(schema, "content must be a list of artifacts")),
        _ => Err(SchemaViolation::new(schema, "content must be a list of artifacts")),
    }
}

fn missing_info(value: Option<Value>) -> Option<Vec<String>> {
    let items: Vec<String> = match value? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    };
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn parse_artifacts(items: Vec<Value>, schema: TargetSchema) -> Result<Artifacts, SchemaViolation> {
    if items.is_empty() {
        return Err(SchemaViolation::new(
            schema,
            format!("no {} in content", schema.artifact_name()),
        ));
    }

    let artifacts = match schema {
        TargetSchema::Requirements => Artifacts::Requirements(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| requirement_from(v, i, schema))
                .collect::<Result<_, _>>()?,
        ),
        TargetSchema::Epics => Artifacts::Epics(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| epic_from(v, i, schema))
                .collect::<Result<_, _>>()?,
        ),
        TargetSchema::UserStories => Artifacts::UserStories(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| story_from(v, i, schema))
                .collect::<Result<_, _>>()?,
        ),
    };

    ensure_unique_ids(&artifacts, schema)?;
    Ok(artifacts)
}

fn ensure_unique_ids(artifacts: &Artifacts, schema: TargetSchema) -> Result<(), SchemaViolation> {
    let ids: Vec<&str> = match artifacts {
        Artifacts::Requirements(items) => items.iter().map(|r| r.id.as_str()).collect(),
        Artifacts::Epics(items) => items.iter().map(|e| e.id.as_str()).collect(),
        Artifacts::UserStories(items) => items.iter().map(|s| s.id.as_str()).collect(),
    };

    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.trim().to_uppercase()) {
            return Err(SchemaViolation::new(schema, format!("duplicate id '{}'", id)));
        }
    }
    Ok(())
}

// ============================================================================
// Field extraction
// ============================================================================

fn as_object<'a>(
    value: &'a Value,
    index: usize,
    schema: TargetSchema,
) -> Result<&'a Map<String, Value>, SchemaViolation> {
    value
        .as_object()
        .ok_or_else(|| SchemaViolation::new(schema, format!("item {}: expected an object", index)))
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_str(
    obj: &Map<String, Value>,
    field: &str,
    index: usize,
    schema: TargetSchema,
) -> Result<String, SchemaViolation> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(SchemaViolation::new(
            schema,
            format!("item {}: missing required field '{}'", index, field),
        )),
        Some(_) => optional_str(obj, field).ok_or_else(|| {
            SchemaViolation::new(
                schema,
                format!("item {}: field '{}' must be a non-empty string", index, field),
            )
        }),
    }
}

fn requirement_from(value: &Value, index: usize, schema: TargetSchema) -> Result<Requirement, SchemaViolation> {
    let obj = as_object(value, index, schema)?;
    let category: RequirementCategory = required_str(obj, "category", index, schema)?
        .parse()
        .map_err(|e| SchemaViolation::new(schema, format!("item {}: {}", index, e)))?;
    let priority: Priority = required_str(obj, "priority", index, schema)?
        .parse()
        .map_err(|e| SchemaViolation::new(schema, format!("item {}: {}", index, e)))?;

    Ok(Requirement {
        id: required_str(obj, "id", index, schema)?,
        title: required_str(obj, "title", index, schema)?,
        description: required_str(obj, "description", index, schema)?,
        category,
        priority,
    })
}

fn epic_from(value: &Value, index: usize, schema: TargetSchema) -> Result<Epic, SchemaViolation> {
    let obj = as_object(value, index, schema)?;

    let related_requirements = match obj.get("related_requirements") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| related_requirement_from(entry, index, schema))
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(SchemaViolation::new(
                schema,
                format!("item {}: related_requirements must be a list", index),
            ))
        }
    };

    Ok(Epic {
        id: required_str(obj, "id", index, schema)?,
        title: required_str(obj, "title", index, schema)?,
        description: required_str(obj, "description", index, schema)?,
        related_requirements,
    })
}

/// Accepts `"REQ-001"`, `"REQ-001: text"` or `{"id": ..., "description": ...}`.
fn related_requirement_from(
    entry: &Value,
    index: usize,
    schema: TargetSchema,
) -> Result<RelatedRequirement, SchemaViolation> {
    match entry {
        Value::String(s) => {
            let (id, description) = match s.split_once(':') {
                Some((id, rest)) if !rest.trim().is_empty() => {
                    (id.trim(), Some(rest.trim().to_string()))
                }
                _ => (s.trim(), None),
            };
            if id.is_empty() {
                return Err(SchemaViolation::new(
                    schema,
                    format!("item {}: blank related requirement id", index),
                ));
            }
            Ok(RelatedRequirement {
                id: id.to_string(),
                description,
            })
        }
        Value::Object(obj) => Ok(RelatedRequirement {
            id: required_str(obj, "id", index, schema)?,
            description: optional_str(obj, "description"),
        }),
        _ => Err(SchemaViolation::new(
            schema,
            format!("item {}: related requirement must be a string or object", index),
        )),
    }
}

fn story_from(value: &Value, index: usize, schema: TargetSchema) -> Result<UserStory, SchemaViolation> {
    let obj = as_object(value, index, schema)?;
    let priority: Priority = required_str(obj, "priority", index, schema)?
        .parse()
        .map_err(|e| SchemaViolation::new(schema, format!("item {}: {}", index, e)))?;

    let acceptance_criteria = match obj.get("acceptance_criteria") {
        None | Some(Value::Null) => {
            return Err(SchemaViolation::new(
                schema,
                format!("item {}: missing required field 'acceptance_criteria'", index),
            ))
        }
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|c| c.as_str())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(_) => {
            return Err(SchemaViolation::new(
                schema,
                format!("item {}: acceptance_criteria must be a list of strings", index),
            ))
        }
    };

    let mut story = UserStory {
        id: required_str(obj, "id", index, schema)?,
        title: required_str(obj, "title", index, schema)?,
        description: required_str(obj, "description", index, schema)?,
        priority,
        assigned_epic: required_str(obj, "assigned_epic", index, schema)?,
        acceptance_criteria,
        role: optional_str(obj, "role"),
        goal: optional_str(obj, "goal"),
        benefit: optional_str(obj, "benefit"),
    };
    story.fill_narrative();
    Ok(story)
}

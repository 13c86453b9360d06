//! Artifact id normalization and input formatting.

use crate::domain::artifacts::{Artifacts, Epic, Language, Requirement, RequirementCategory};

/// Number of epics sent to the model per user-story request.
pub const STORY_GROUP_SIZE: usize = 5;

/// Rewrites ids into canonical sequential form.
///
/// Functional requirements become `REQ-001`, `REQ-002`, ... and
/// non-functional ones `REQ-NF-001`, ... (numbered separately). Epics become
/// `EPIC-###` and stories `US-###`, in list order.
pub fn normalize_ids(artifacts: &mut Artifacts) {
    match artifacts {
        Artifacts::Requirements(items) => {
            let mut functional = 0;
            let mut non_functional = 0;
            for req in items.iter_mut() {
                req.id = match req.category {
                    RequirementCategory::Functional => {
                        functional += 1;
                        format!("REQ-{:03}", functional)
                    }
                    RequirementCategory::NonFunctional => {
                        non_functional += 1;
                        format!("REQ-NF-{:03}", non_functional)
                    }
                };
            }
        }
        Artifacts::Epics(items) => {
            for (i, epic) in items.iter_mut().enumerate() {
                epic.id = format!("EPIC-{:03}", i + 1);
            }
        }
        Artifacts::UserStories(items) => {
            for (i, story) in items.iter_mut().enumerate() {
                story.id = format!("US-{:03}", i + 1);
            }
        }
    }
}

/// Formats requirements as `- (ID) Title: Description` lines.
pub fn format_requirements(requirements: &[Requirement]) -> String {
    requirements
        .iter()
        .map(|r| format!("- ({}) {}: {}", r.id, r.title, r.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats epics as labelled blocks listing the requirements each covers.
pub fn format_epics(epics: &[Epic], language: Language) -> String {
    let (description_label, requirements_label) = match language {
        Language::English => ("Description", "Requirements"),
        Language::Spanish => ("Descripción", "Requerimientos"),
    };

    epics
        .iter()
        .map(|epic| {
            let mut block = format!(
                "EPIC: {} ({})\n{}: {}",
                epic.title, epic.id, description_label, epic.description
            );
            if !epic.related_requirements.is_empty() {
                block.push_str(&format!("\n{}:", requirements_label));
                for req in &epic.related_requirements {
                    match &req.description {
                        Some(desc) => block.push_str(&format!("\n- {}: {}", req.id, desc)),
                        None => block.push_str(&format!("\n- {}", req.id)),
                    }
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits epics into consecutive groups of at most `size`.
pub fn epic_groups(epics: &[Epic], size: usize) -> Vec<&[Epic]> {
    epics.chunks(size.max(1)).collect()
}

//! Prompt composer.
//!
//! Merges conversation history, retrieved context and the current message
//! into a model-ready prompt for a target schema. Composition is a pure
//! function of its inputs: identical inputs render identical prompt text.

use std::fmt::Write as _;

use super::prompts;
use crate::domain::artifacts::{Language, TargetSchema};
use crate::domain::knowledge::RetrievedChunk;
use crate::domain::session::Turn;
use crate::ports::{Message, MessageRole};

/// A composed prompt: system instruction plus ordered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub messages: Vec<Message>,
}

impl Prompt {
    /// Renders the prompt as a single text block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "[system]\n{}\n", self.system_instruction);
        for message in &self.messages {
            let role = match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            let _ = write!(out, "\n[{}]\n{}\n", role, message.content);
        }
        out
    }

    /// The final user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Builds prompts for generation, contextualization and repair.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    max_history_turns: usize,
}

impl PromptComposer {
    pub fn new(max_history_turns: usize) -> Self {
        Self { max_history_turns }
    }

    /// Composes the generation prompt.
    ///
    /// History is included oldest to newest, limited to the most recent
    /// `max_history_turns`; chunks appear in the order given.
    pub fn compose(
        &self,
        history: &[Turn],
        chunks: &[RetrievedChunk],
        message: &str,
        schema: TargetSchema,
        language: Language,
    ) -> Prompt {
        let mut system = String::new();
        system.push_str(prompts::persona_for(schema, language));
        system.push_str("\n\n");
        system.push_str(prompts::context_heading(language));
        system.push_str("\n\n");
        system.push_str(&render_context(chunks, language));
        system.push_str("\n\n");
        system.push_str(prompts::output_contract_for(schema, language));
        system.push_str("\n\n");
        system.push_str(prompts::closing_rules(language));

        let mut messages = self.history_messages(history);
        messages.push(Message::user(message));

        Prompt {
            system_instruction: system,
            messages,
        }
    }

    /// Composes the prompt that rewrites a follow-up into a standalone question.
    pub fn compose_standalone_question(
        &self,
        history: &[Turn],
        message: &str,
        language: Language,
    ) -> Prompt {
        let mut messages = self.history_messages(history);
        messages.push(Message::user(message));

        Prompt {
            system_instruction: prompts::standalone_question_instruction(language).to_string(),
            messages,
        }
    }

    /// Extends a prompt with the rejected answer and a request to fix it.
    pub fn compose_repair(
        &self,
        original: &Prompt,
        rejected_output: &str,
        problem: &str,
        language: Language,
    ) -> Prompt {
        let mut repaired = original.clone();
        repaired
            .messages
            .push(Message::assistant(rejected_output));
        repaired.messages.push(Message::user(
            prompts::repair_instruction(language).replace("{problem}", problem),
        ));
        repaired
    }

    fn history_messages(&self, history: &[Turn]) -> Vec<Message> {
        let start = history.len().saturating_sub(self.max_history_turns);
        history[start..]
            .iter()
            .flat_map(|turn| {
                [
                    Message::user(turn.query.clone()),
                    Message::assistant(turn.response_text()),
                ]
            })
            .collect()
    }
}

fn render_context(chunks: &[RetrievedChunk], language: Language) -> String {
    if chunks.is_empty() {
        return prompts::empty_context(language).to_string();
    }
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] ({})\n{}", i + 1, chunk.source, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifacts::{ArtifactEnvelope, ResponseStatus};
    use crate::domain::foundation::Timestamp;
    use proptest::prelude::*;

    fn turn(sequence: u32, query: &str) -> Turn {
        Turn {
            sequence,
            schema: TargetSchema::Requirements,
            query: query.to_string(),
            envelope: ArtifactEnvelope::with_text(ResponseStatus::GeneralResponse, query, "noted"),
            sources: vec![],
            timestamp: Timestamp::now(),
        }
    }

    fn chunk(text: &str, source: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            source: source.to_string(),
            score,
        }
    }

    #[test]
    fn message_order_is_history_then_current() {
        let composer = PromptComposer::new(10);
        let history = vec![turn(0, "first"), turn(1, "second")];
        let prompt = composer.compose(&history, &[], "third", TargetSchema::Requirements, Language::English);

        let roles: Vec<MessageRole> = prompt.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(prompt.messages[0].content, "first");
        assert_eq!(prompt.messages[2].content, "second");
        assert_eq!(prompt.last_user_message(), Some("third"));
    }

    #[test]
    fn history_window_keeps_most_recent_turns() {
        let composer = PromptComposer::new(1);
        let history = vec![turn(0, "old"), turn(1, "recent")];
        let prompt = composer.compose(&history, &[], "now", TargetSchema::Epics, Language::English);
        assert_eq!(prompt.messages.len(), 3);
        assert_eq!(prompt.messages[0].content, "recent");
    }

    #[test]
    fn chunks_appear_in_rank_order() {
        let composer = PromptComposer::new(5);
        let chunks = vec![chunk("alpha text", "a.md", 0.9), chunk("beta text", "b.md", 0.5)];
        let prompt = composer.compose(&[], &chunks, "q", TargetSchema::Requirements, Language::English);
        let alpha = prompt.system_instruction.find("alpha text").unwrap();
        let beta = prompt.system_instruction.find("beta text").unwrap();
        assert!(alpha < beta);
        assert!(prompt.system_instruction.contains("[1] (a.md)"));
    }

    #[test]
    fn empty_context_uses_placeholder() {
        let composer = PromptComposer::new(5);
        let prompt = composer.compose(&[], &[], "q", TargetSchema::UserStories, Language::Spanish);
        assert!(prompt.system_instruction.contains("no hay contexto adicional"));
        assert!(prompt.system_instruction.contains("US-###"));
    }

    #[test]
    fn repair_appends_rejected_output_and_problem() {
        let composer = PromptComposer::new(5);
        let base = composer.compose(&[], &[], "q", TargetSchema::Requirements, Language::English);
        let repaired = composer.compose_repair(&base, "not json", "no JSON object found", Language::English);

        assert_eq!(repaired.messages.len(), base.messages.len() + 2);
        assert_eq!(repaired.messages[1].role, MessageRole::Assistant);
        assert_eq!(repaired.messages[1].content, "not json");
        assert!(repaired.messages[2].content.contains("no JSON object found"));
    }

    #[test]
    fn standalone_prompt_ends_with_message() {
        let composer = PromptComposer::new(5);
        let prompt = composer.compose_standalone_question(&[turn(0, "pos system")], "add returns", Language::English);
        assert!(prompt.system_instruction.contains("standalone question"));
        assert_eq!(prompt.last_user_message(), Some("add returns"));
    }

    #[test]
    fn render_lists_roles_in_order() {
        let composer = PromptComposer::new(5);
        let prompt = composer.compose(&[turn(0, "x")], &[], "y", TargetSchema::Requirements, Language::English);
        let rendered = prompt.render();
        let system = rendered.find("[system]").unwrap();
        let user = rendered.find("[user]").unwrap();
        let assistant = rendered.find("[assistant]").unwrap();
        assert!(system < user && user < assistant);
    }

    proptest! {
        #[test]
        fn compose_is_deterministic(
            queries in proptest::collection::vec("[a-zA-Z ]{1,20}", 0..5),
            texts in proptest::collection::vec("[a-z ]{1,40}", 0..5),
            message in "[a-zA-Z ]{1,40}",
        ) {
            let composer = PromptComposer::new(3);
            let history: Vec<Turn> = queries.iter().enumerate().map(|(i, q)| turn(i as u32, q)).collect();
            let chunks: Vec<RetrievedChunk> = texts.iter().map(|t| chunk(t, "kb.md", 0.5)).collect();

            let a = composer.compose(&history, &chunks, &message, TargetSchema::Epics, Language::English);
            let b = composer.compose(&history, &chunks, &message, TargetSchema::Epics, Language::English);
            prop_assert_eq!(a.render(), b.render());
            prop_assert_eq!(a, b);
        }
    }
}

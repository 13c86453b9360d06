//! Generation pipeline.
//!
//! Orchestrates one request end to end: resolve and lock the session,
//! retrieve context, compose the prompt, call the model, validate the
//! answer (re-prompting with the violation when it is unusable) and record
//! the turn. A turn is appended only after a usable answer, so a failed or
//! cancelled request leaves the session untouched.

use futures::future::try_join_all;
use std::sync::Arc;

use super::{GenerationError, Retriever, SessionManager};
use crate::domain::artifacts::{
    ArtifactEnvelope, Artifacts, Epic, Language, Requirement, TargetSchema,
};
use crate::domain::foundation::SessionId;
use crate::domain::generation::{
    epic_groups, format_epics, format_requirements, normalize_ids, Prompt, PromptComposer,
    ResponseParser, STORY_GROUP_SIZE,
};
use crate::domain::knowledge::RetrievedChunk;
use crate::domain::session::Session;
use crate::ports::{AIProvider, CompletionRequest, RequestMetadata};

/// Tunables for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Chunks retrieved per request.
    pub top_k: usize,
    /// Sampling temperature passed to the model.
    pub temperature: f32,
    /// Extra model calls allowed after a schema violation.
    pub max_repair_attempts: u32,
    /// Rewrite follow-ups into standalone questions before retrieval.
    pub contextualize_queries: bool,
    /// Cap on tokens generated per model call; the model default when unset.
    pub max_output_tokens: Option<u32>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.2,
            max_repair_attempts: 1,
            contextualize_queries: false,
            max_output_tokens: None,
        }
    }
}

/// A validated answer and the session it was recorded in.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub session_id: SessionId,
    pub envelope: ArtifactEnvelope,
}

pub struct GenerationPipeline {
    sessions: Arc<SessionManager>,
    retriever: Retriever,
    provider: Arc<dyn AIProvider>,
    composer: PromptComposer,
    parser: ResponseParser,
    settings: PipelineSettings,
}

impl GenerationPipeline {
    pub fn new(
        sessions: Arc<SessionManager>,
        retriever: Retriever,
        provider: Arc<dyn AIProvider>,
        composer: PromptComposer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sessions,
            retriever,
            provider,
            composer,
            parser: ResponseParser::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Generates requirements from a free-text project description.
    pub async fn chat(&self, message: &str, session_id: &str) -> Result<GenerationOutcome, GenerationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }
        self.run(session_id, TargetSchema::Requirements, message).await
    }

    /// Groups requirements into epics.
    pub async fn generate_epics(
        &self,
        requirements: &[Requirement],
        session_id: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        if requirements.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "at least one requirement is required".to_string(),
            ));
        }
        let message = format_requirements(requirements);
        self.run(session_id, TargetSchema::Epics, &message).await
    }

    /// Breaks epics into user stories.
    ///
    /// Epics are sent in groups of [`STORY_GROUP_SIZE`], concurrently. The
    /// resulting stories are merged in group order and renumbered, and the
    /// whole call is recorded as a single turn.
    pub async fn generate_user_stories(
        &self,
        epics: &[Epic],
        session_id: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        if epics.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "at least one epic is required".to_string(),
            ));
        }

        let schema = TargetSchema::UserStories;
        let mut session = self.sessions.resolve_session(session_id).await?;
        let language = Language::detect(
            &epics
                .iter()
                .map(|e| format!("{} {}", e.title, e.description))
                .collect::<Vec<_>>()
                .join(" "),
        );
        let message = format_epics(epics, language);

        let groups = epic_groups(epics, STORY_GROUP_SIZE);
        tracing::info!(
            session_id = %session.id(),
            epics = epics.len(),
            groups = groups.len(),
            "Generating user stories"
        );

        let session_ref: &Session = &session;
        let results = try_join_all(groups.iter().map(|group| {
            let group_message = format_epics(group, language);
            async move {
                let chunks = self.retriever.retrieve(&group_message, self.settings.top_k).await?;
                let prompt = self
                    .composer
                    .compose(session_ref.turns(), &chunks, &group_message, schema, language);
                let envelope = self.generate(&prompt, schema, language, session_ref.id()).await?;
                Ok::<_, GenerationError>((envelope, chunks))
            }
        }))
        .await?;

        let mut stories = Vec::new();
        let mut chunks = Vec::new();
        let mut fallback = None;
        for (envelope, group_chunks) in results {
            chunks.extend(group_chunks);
            match envelope.artifacts() {
                Some(Artifacts::UserStories(items)) => stories.extend(items.iter().cloned()),
                _ => {
                    tracing::warn!(status = %envelope.status, "Story group returned no stories");
                    fallback.get_or_insert(envelope);
                }
            }
        }

        let envelope = match fallback {
            Some(text) if stories.is_empty() => text,
            _ => ArtifactEnvelope::with_artifacts("", Artifacts::UserStories(stories)),
        };

        self.record(&mut session, schema, &message, envelope, &chunks).await
    }

    async fn run(
        &self,
        session_id: &str,
        schema: TargetSchema,
        message: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        let mut session = self.sessions.resolve_session(session_id).await?;
        let language = Language::detect(message);
        tracing::info!(session_id = %session.id(), %schema, language = language.code(), "Generating artifacts");

        let search_query = self.search_query(&session, message, language).await?;
        let chunks = self.retriever.retrieve(&search_query, self.settings.top_k).await?;
        let prompt = self
            .composer
            .compose(session.turns(), &chunks, message, schema, language);

        let envelope = self.generate(&prompt, schema, language, session.id()).await?;
        self.record(&mut session, schema, message, envelope, &chunks).await
    }

    /// The text used for retrieval: the message itself, or a standalone
    /// rewrite of it when contextualization is on and there is history.
    async fn search_query(
        &self,
        session: &Session,
        message: &str,
        language: Language,
    ) -> Result<String, GenerationError> {
        if !self.settings.contextualize_queries || session.is_empty() {
            return Ok(message.to_string());
        }

        let prompt = self
            .composer
            .compose_standalone_question(session.turns(), message, language);
        let metadata = RequestMetadata::new("contextualize").with_session(*session.id());
        let request = CompletionRequest::from_prompt(&prompt, metadata).with_temperature(0.0);
        let response = self.provider.complete(request).await?;

        let rewritten = response.content.trim();
        if rewritten.is_empty() {
            return Ok(message.to_string());
        }
        tracing::debug!(session_id = %session.id(), rewritten, "Contextualized query");
        Ok(rewritten.to_string())
    }

    /// Calls the model and validates its answer, re-prompting with the
    /// violation up to `max_repair_attempts` times.
    async fn generate(
        &self,
        prompt: &Prompt,
        schema: TargetSchema,
        language: Language,
        session_id: &SessionId,
    ) -> Result<ArtifactEnvelope, GenerationError> {
        let metadata = RequestMetadata::new("generate")
            .with_session(*session_id)
            .with_schema(schema);

        let mut current = prompt.clone();
        let mut attempt = 0;
        loop {
            let mut request = CompletionRequest::from_prompt(&current, metadata.clone())
                .with_temperature(self.settings.temperature);
            if let Some(max) = self.settings.max_output_tokens {
                request = request.with_max_tokens(max);
            }
            let response = self.provider.complete(request).await?;

            match self.parser.parse(&response.content, schema) {
                Ok(envelope) => return Ok(envelope),
                Err(violation) if attempt < self.settings.max_repair_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        session_id = %session_id,
                        %schema,
                        attempt,
                        reason = %violation.reason,
                        "Model output rejected, requesting repair"
                    );
                    current = self
                        .composer
                        .compose_repair(prompt, &response.content, &violation.reason, language);
                }
                Err(violation) => {
                    tracing::error!(
                        session_id = %session_id,
                        %schema,
                        reason = %violation.reason,
                        "Model output rejected"
                    );
                    return Err(violation.into());
                }
            }
        }
    }

    async fn record(
        &self,
        session: &mut Session,
        schema: TargetSchema,
        message: &str,
        mut envelope: ArtifactEnvelope,
        chunks: &[RetrievedChunk],
    ) -> Result<GenerationOutcome, GenerationError> {
        envelope.query = message.to_string();
        if let Some(artifacts) = envelope.artifacts_mut() {
            normalize_ids(artifacts);
        }

        let mut sources: Vec<String> = Vec::new();
        for chunk in chunks {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }

        self.sessions
            .append_turn(session, schema, message, envelope.clone(), sources)
            .await?;

        Ok(GenerationOutcome {
            session_id: *session.id(),
            envelope,
        })
    }
}

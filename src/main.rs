use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backlog_forge::adapters::ai::{
    GeminiConfig, GeminiProvider, MockAIProvider, RetryPolicy, RetryingAIProvider,
};
use backlog_forge::adapters::embeddings::{GeminiEmbedder, HashingEmbedder};
use backlog_forge::adapters::http::{app_router, GenerationHandlers, KnowledgeHandlers, RouterSettings};
use backlog_forge::adapters::storage::{FileSessionRepository, InMemorySessionRepository};
use backlog_forge::adapters::vector::InMemoryDocumentStore;
use backlog_forge::application::{
    GenerationPipeline, KnowledgeService, PipelineSettings, Retriever, SessionManager,
};
use backlog_forge::config::{AiConfig, AiProvider, AppConfig, ServerConfig};
use backlog_forge::domain::generation::PromptComposer;
use backlog_forge::domain::knowledge::TextSplitter;
use backlog_forge::ports::{AIProvider, DocumentStore, EmbeddingProvider, SessionRepository};

/// Initialize tracing: JSON lines in production, human-readable otherwise.
/// `RUST_LOG` overrides the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn gemini_config(ai: &AiConfig) -> anyhow::Result<GeminiConfig> {
    use secrecy::ExposeSecret;

    let key = ai
        .gemini_api_key
        .as_ref()
        .context("BACKLOG_FORGE__AI__GEMINI_API_KEY is not set")?;
    let mut config = GeminiConfig::new(key.expose_secret().as_str())
        .with_model(&ai.model)
        .with_embedding_model(&ai.embedding_model)
        .with_timeout(ai.timeout())
        .with_temperature(ai.temperature);
    if let Some(url) = &ai.base_url {
        config = config.with_base_url(url);
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.server);
    config.validate().context("invalid configuration")?;

    let provider: Arc<dyn AIProvider> = match config.ai.provider {
        AiProvider::Gemini => {
            let gemini = GeminiProvider::new(gemini_config(&config.ai)?)?;
            let policy = RetryPolicy::new(config.ai.max_retries, config.ai.retry_backoff())
                .with_attempt_timeout(config.ai.timeout());
            Arc::new(RetryingAIProvider::new(gemini).with_policy(policy))
        }
        AiProvider::Mock => {
            tracing::warn!("Using the mock language model; answers are canned");
            Arc::new(MockAIProvider::new())
        }
    };
    let info = provider.provider_info();
    tracing::info!(
        provider = %info.name,
        model = %info.model,
        max_context_tokens = info.max_context_tokens,
        max_output_tokens = ?config.ai.max_output_tokens,
        "Language model ready"
    );

    let embedder: Arc<dyn EmbeddingProvider> =
        if config.retrieval.use_local_embeddings || config.ai.provider == AiProvider::Mock {
            Arc::new(HashingEmbedder::default())
        } else {
            Arc::new(GeminiEmbedder::new(gemini_config(&config.ai)?)?)
        };
    tracing::info!(model = embedder.model_name(), "Embedding model ready");

    let store: Arc<dyn DocumentStore> = match &config.retrieval.store_path {
        Some(path) => Arc::new(InMemoryDocumentStore::open(path).await?),
        None => Arc::new(InMemoryDocumentStore::new()),
    };

    let repository: Arc<dyn SessionRepository> = match &config.storage.sessions_dir {
        Some(dir) => {
            tracing::info!(path = %dir.display(), "Persisting sessions to disk");
            Arc::new(FileSessionRepository::new(dir))
        }
        None => Arc::new(InMemorySessionRepository::new()),
    };
    let sessions = Arc::new(SessionManager::new(repository));

    let pipeline = Arc::new(GenerationPipeline::new(
        sessions.clone(),
        Retriever::new(embedder.clone(), store.clone()),
        provider,
        PromptComposer::new(config.retrieval.max_history_turns),
        PipelineSettings {
            top_k: config.retrieval.top_k,
            temperature: config.ai.temperature,
            max_repair_attempts: config.ai.max_repair_attempts,
            contextualize_queries: config.retrieval.contextualize_queries,
            max_output_tokens: config.ai.max_output_tokens,
        },
    ));

    let splitter = TextSplitter::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap)?;
    let knowledge = KnowledgeService::new(splitter, embedder, store, sessions.clone())
        .with_knowledge_dir(config.retrieval.knowledge_dir.clone())
        .with_subdirs(config.retrieval.knowledge_subdirs_list());
    knowledge
        .ingest_directory(&config.retrieval.knowledge_dir)
        .await
        .context("failed to ingest knowledge directory")?;

    let app = app_router(
        GenerationHandlers::new(pipeline, sessions),
        KnowledgeHandlers::new(Arc::new(knowledge)),
        &RouterSettings {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Backlog Forge listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

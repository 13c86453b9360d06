//! Integration tests for the HTTP API.
//!
//! These tests drive the full router end to end:
//! 1. Generation endpoints return validated envelopes with canonical ids
//! 2. Errors map to the documented status codes
//! 3. Session history can be read and deleted
//! 4. Knowledge added over HTTP reaches the model's context

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use backlog_forge::adapters::ai::{MockAIProvider, MockError};
use backlog_forge::adapters::embeddings::HashingEmbedder;
use backlog_forge::adapters::http::{app_router, GenerationHandlers, KnowledgeHandlers, RouterSettings};
use backlog_forge::adapters::storage::InMemorySessionRepository;
use backlog_forge::adapters::vector::InMemoryDocumentStore;
use backlog_forge::application::{
    GenerationPipeline, KnowledgeService, PipelineSettings, Retriever, SessionManager,
};
use backlog_forge::domain::artifacts::TargetSchema;
use backlog_forge::domain::generation::PromptComposer;
use backlog_forge::domain::knowledge::TextSplitter;
use backlog_forge::ports::{CompletionRequest, DocumentStore, EmbeddingProvider};

// =============================================================================
// Test Infrastructure
// =============================================================================

const REQUIREMENTS_JSON: &str = r#"{"status": "REQUIREMENTS_GENERATED", "content": [
    {"id": "1", "title": "Product Registration", "description": "Register products with price, stock and category", "category": "Functional", "priority": "High"},
    {"id": "2", "title": "Branch Sales", "description": "Record sales at each branch and update stock", "category": "Functional", "priority": "High"},
    {"id": "3", "title": "Availability", "description": "The system is available 99.9% of business hours", "category": "Non-functional", "priority": "Medium"}
], "missing_info": null, "metadata": null}"#;

const EPICS_JSON: &str = r#"{"status": "EPICS_GENERATED", "content": [
    {"id": "E1", "title": "Product Management", "description": "Covers product management: registering and maintaining the catalog", "related_requirements": [{"id": "REQ-001", "description": "Product Registration"}]}
]}"#;

const STORIES_JSON: &str = r#"{"status": "STORIES_GENERATED", "content": [
    {"id": "S1", "title": "Register a product", "description": "As a store manager, I want to register products, so that they can be sold", "priority": "High", "assigned_epic": "EPIC-001", "acceptance_criteria": ["Product is saved with price and stock"]}
]}"#;

/// Answers according to the schema the pipeline asked for.
fn scripted_model(request: &CompletionRequest) -> String {
    match request.metadata.schema {
        Some(TargetSchema::Requirements) => REQUIREMENTS_JSON.to_string(),
        Some(TargetSchema::Epics) => EPICS_JSON.to_string(),
        Some(TargetSchema::UserStories) => STORIES_JSON.to_string(),
        None => r#"{"status": "GENERAL_RESPONSE", "content": "ok"}"#.to_string(),
    }
}

struct TestApp {
    router: Router,
    provider: MockAIProvider,
}

fn test_app(provider: MockAIProvider) -> TestApp {
    let sessions = Arc::new(SessionManager::new(Arc::new(InMemorySessionRepository::new())));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::default());
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

    let pipeline = Arc::new(GenerationPipeline::new(
        sessions.clone(),
        Retriever::new(embedder.clone(), store.clone()),
        Arc::new(provider.clone()),
        PromptComposer::new(10),
        PipelineSettings::default(),
    ));
    let knowledge = KnowledgeService::new(
        TextSplitter::new(400, 40).unwrap(),
        embedder,
        store,
        sessions.clone(),
    );

    let router = app_router(
        GenerationHandlers::new(pipeline, sessions),
        KnowledgeHandlers::new(Arc::new(knowledge)),
        &RouterSettings::default(),
    );
    TestApp { router, provider }
}

fn scripted_app() -> TestApp {
    test_app(MockAIProvider::new().with_responder(scripted_model))
}

async fn send_raw(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_raw(app, request).await
}

async fn post(app: &TestApp, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn start_session(app: &TestApp) -> String {
    let (status, body) = post(
        app,
        "/chat",
        json!({"message": "Point-of-sale system for a store with several branches", "session_id": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

fn last_user_message(provider: &MockAIProvider) -> String {
    provider
        .get_calls()
        .last()
        .and_then(|call| call.messages.last())
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

// =============================================================================
// Generation endpoints
// =============================================================================

#[tokio::test]
async fn chat_with_empty_session_starts_new_session_with_requirements() {
    let app = scripted_app();

    let (status, body) = post(
        &app,
        "/chat",
        json!({"message": "Point-of-sale system for a store with several branches", "session_id": ""}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    let message = &body["message"];
    assert_eq!(message["status"], "REQUIREMENTS_GENERATED");
    assert_eq!(
        message["query"],
        "Point-of-sale system for a store with several branches"
    );

    let requirements = message["content"].as_array().unwrap();
    assert_eq!(requirements.len(), 3);
    for req in requirements {
        for field in ["id", "title", "description", "category", "priority"] {
            assert!(req.get(field).is_some(), "missing {} in {}", field, req);
        }
    }
    let ids: Vec<&str> = requirements.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["REQ-001", "REQ-002", "REQ-NF-001"]);
}

#[tokio::test]
async fn follow_up_chat_keeps_session_and_sends_history() {
    let app = scripted_app();
    let session_id = start_session(&app).await;

    let (status, body) = post(
        &app,
        "/chat",
        json!({"message": "Also add loyalty points for customers", "session_id": session_id}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], session_id.as_str());
    let calls = app.provider.get_calls();
    assert!(calls.last().unwrap().messages.len() > 1);
}

#[tokio::test]
async fn generate_epics_from_requirement_batches() {
    let app = scripted_app();

    let (status, body) = post(
        &app,
        "/generate-epics",
        json!({
            "requirements_description": [[{
                "id": "REQ-001",
                "title": "Product Registration",
                "description": "Register products with price and stock",
                "category": "Functional",
                "priority": "High"
            }]],
            "session_id": ""
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["status"], "EPICS_GENERATED");
    let epic = &body["message"]["content"][0];
    assert_eq!(epic["id"], "EPIC-001");
    assert!(epic["description"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("product management"));
    assert!(last_user_message(&app.provider).contains("(REQ-001) Product Registration"));
}

#[tokio::test]
async fn generate_user_stories_from_epic_envelope() {
    let app = scripted_app();
    let epics = json!({"content": [{
        "id": "EPIC-001",
        "title": "Product Management",
        "description": "Registering and maintaining the catalog",
        "related_requirements": [{"id": "REQ-001"}]
    }]});

    for path in ["/generate-userstories", "/generate-user-stories"] {
        let (status, body) = post(&app, path, json!({"epic_description": epics})).await;

        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(body["message"]["status"], "STORIES_GENERATED");
        let story = &body["message"]["content"][0];
        assert_eq!(story["id"], "US-001");
        assert_eq!(story["assigned_epic"], "EPIC-001");
        assert_eq!(story["role"], "store manager");
    }
}

// =============================================================================
// Error mapping
// =============================================================================

#[tokio::test]
async fn unknown_session_returns_404() {
    let app = scripted_app();

    for session_id in ["3f2b8c1e-9a4d-4e6f-8b1a-2c3d4e5f6a7b", "not-a-session"] {
        let (status, body) = post(
            &app,
            "/chat",
            json!({"message": "POS system", "session_id": session_id}),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{}", session_id);
        assert_eq!(body["code"], "NOT_FOUND");
    }
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let app = scripted_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send_raw(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn missing_message_field_returns_400() {
    let app = scripted_app();

    let (status, _) = post(&app, "/chat", json!({"session_id": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_message_returns_400() {
    let app = scripted_app();

    let (status, _) = post(&app, "/chat", json!({"message": "   "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn unparseable_model_output_returns_502_after_repair() {
    let app = test_app(MockAIProvider::new().with_responder(|_| "I cannot help with that.".to_string()));

    let (status, body) = post(&app, "/chat", json!({"message": "POS system for a store"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "SCHEMA_VIOLATION");
    // One original attempt plus one repair.
    assert_eq!(app.provider.call_count(), 2);
}

#[tokio::test]
async fn upstream_failures_map_to_503_and_504() {
    let app = test_app(
        MockAIProvider::new()
            .with_error(MockError::Unavailable {
                message: "overloaded".to_string(),
            })
            .with_error(MockError::Timeout { timeout_secs: 60 }),
    );

    let (status, body) = post(&app, "/chat", json!({"message": "POS system"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");

    let (status, body) = post(&app, "/chat", json!({"message": "POS system"})).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_can_be_read_and_deleted() {
    let app = scripted_app();
    let session_id = start_session(&app).await;
    let uri = format!("/chat/history/{}", session_id);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], session_id.as_str());
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["schema"], "requirements");
    assert_eq!(history[0]["envelope"]["status"], "REQUIREMENTS_GENERATED");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_unknown_history_returns_404() {
    let app = scripted_app();

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/chat/history/3f2b8c1e-9a4d-4e6f-8b1a-2c3d4e5f6a7b",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Knowledge and health
// =============================================================================

#[tokio::test]
async fn health_reports_empty_knowledge_base() {
    let app = scripted_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "documents": 0}));
}

#[tokio::test]
async fn added_knowledge_is_counted_and_reaches_the_prompt() {
    let app = scripted_app();

    let (status, body) = post(
        &app,
        "/knowledge/add",
        json!({
            "content": "Point-of-sale terminals must print fiscal receipts for every sale.",
            "source_name": "pos_notes.txt"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let added = body["chunks_added"].as_u64().unwrap();
    assert!(added >= 1);

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["documents"].as_u64().unwrap(), added);

    post(&app, "/chat", json!({"message": "Point-of-sale system with receipts"})).await;
    let system_prompt = app.provider.get_calls()[0].system_prompt.clone().unwrap();
    assert!(system_prompt.contains("fiscal receipts"));
}

#[tokio::test]
async fn blank_knowledge_content_returns_400() {
    let app = scripted_app();

    let (status, _) = post(&app, "/knowledge/add", json!({"content": "  "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn learn_from_response_stores_latest_turn() {
    let app = scripted_app();
    let session_id = start_session(&app).await;

    let (status, body) = post(
        &app,
        "/knowledge/learn-from-response",
        json!({"session_id": session_id}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["file"].as_str().unwrap(),
        format!("learned_{}_0.txt", session_id)
    );
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("Question: Point-of-sale system"));
    assert!(content.contains("Answer: "));
    assert!(body["chunks_added"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn learn_from_unknown_session_returns_404() {
    let app = scripted_app();

    let (status, _) = post(
        &app,
        "/knowledge/learn-from-response",
        json!({"session_id": "3f2b8c1e-9a4d-4e6f-8b1a-2c3d4e5f6a7b"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = scripted_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

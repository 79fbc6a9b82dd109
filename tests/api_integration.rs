//! End-to-end tests for the HTTP surface, driven through the router
//! with an in-memory database and a stubbed model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use zenark::chat::{ChatMemory, ChatService};
use zenark::config::{ChatConfig, FallbackConfig, JournalConfig, QueueConfig, ReportConfig};
use zenark::error::LlmError;
use zenark::fallback::FallbackPolicy;
use zenark::journal::{JournalRouteState, JournalService};
use zenark::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use zenark::queue::RequestQueue;
use zenark::report::ReportGenerator;
use zenark::server::{ApiState, build_router};
use zenark::store::{Database, LibSqlBackend};

struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: "Try one focused 25 minute session, then rest. 2".to_string(),
            input_tokens: 12,
            output_tokens: 10,
        })
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// The full router wired to a stub model and a fresh in-memory database.
/// The queue cap is raised so tests never wait out a rate window.
async fn app() -> Router {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.expect("in-memory db"));
    let llm: Arc<dyn LlmProvider> = Arc::new(StubLlm);
    let queue = RequestQueue::new(QueueConfig {
        max_requests_per_window: 100,
        ..QueueConfig::default()
    });

    let chat = ChatService::new(
        Arc::clone(&llm),
        Arc::clone(&queue),
        FallbackPolicy::new(FallbackConfig::default()),
        ChatMemory::new(Arc::clone(&db)),
        ChatConfig::default(),
    );
    let reports = ReportGenerator::new(llm, queue, ReportConfig::default());
    let journal = JournalService::new(Arc::clone(&db), JournalConfig::default());

    let api = ApiState {
        chat: Arc::new(chat),
        reports: Arc::new(reports),
        db,
    };
    let journal = JournalRouteState {
        service: Arc::new(journal),
    };
    build_router(api, journal)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn chat_greeting_is_answered_without_the_model() {
    let app = app().await;
    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "greeting");
    assert!(!body["response"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn chat_uses_the_model_for_substantive_messages() {
    let app = app().await;
    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "my board exams are close and I am anxious"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "model");
    assert!(body["response"].as_str().unwrap().contains("25 minute"));
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let app = app().await;
    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_history_can_be_cleared() {
    let app = app().await;
    app.clone()
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "hello"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/chat/history/u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
}

#[tokio::test]
async fn report_requires_conversation_history() {
    let app = app().await;
    let response = app
        .oneshot(post_json("/api/report/u-silent", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "no conversation history to report on");
}

#[tokio::test]
async fn report_has_three_sections_and_a_score() {
    let app = app().await;
    app.clone()
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "I keep procrastinating before my exams"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json("/api/report/u1", json!({"name": "Asha"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Asha");
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0]["name"], "TherapistAgent");
    assert_eq!(sections[1]["name"], "DataAnalystAgent");
    assert_eq!(sections[2]["name"], "RoutinePlannerAgent");
    assert_eq!(body["distress_score"]["value"], 2);
}

#[tokio::test]
async fn journal_entry_starts_a_streak() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/journal/entry",
            json!({
                "user_id": "u1",
                "mood": "😊",
                "title": "Good day",
                "content": "Finished my revision plan and felt calm.",
                "tags": ["#study"],
                "time_spent": 400,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["streak_updated"], true);
    assert_eq!(body["current_streak"], 1);

    let response = app
        .oneshot(get("/api/journal/streak?user_id=u1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["current_streak"], 1);
}

#[tokio::test]
async fn journal_entry_validation_rejects_short_titles() {
    let app = app().await;
    let response = app
        .oneshot(post_json(
            "/api/journal/entry",
            json!({
                "user_id": "u1",
                "mood": "😊",
                "title": "ab",
                "content": "long enough content here",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Title must be at least 3 characters");
}

#[tokio::test]
async fn daily_prompt_is_served() {
    let app = app().await;
    let response = app.oneshot(get("/api/journal/daily-prompt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(!body["text"].as_str().unwrap().is_empty());
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn dashboard_counts_activity() {
    let app = app().await;
    app.clone()
        .oneshot(post_json(
            "/api/chat",
            json!({"user_id": "u1", "message": "hello"}),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/analytics/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_users"], 1);
    // Greeting plus canned reply are both stored turns.
    assert_eq!(body["total_conversations"], 2);
    assert_eq!(body["total_reports"], 0);
}

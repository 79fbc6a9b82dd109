//! HTTP surface — chat and report endpoints, router assembly.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::analytics::{AnalyticsRouteState, analytics_routes};
use crate::chat::ChatService;
use crate::error::{ChatError, ReportError};
use crate::journal::{JournalRouteState, journal_routes};
use crate::report::ReportGenerator;
use crate::store::Database;

/// How many stored turns feed a report transcript.
const REPORT_TRANSCRIPT_TURNS: usize = 200;

/// Shared state for chat and report routes.
#[derive(Clone)]
pub struct ApiState {
    pub chat: Arc<ChatService>,
    pub reports: Arc<ReportGenerator>,
    pub db: Arc<dyn Database>,
}

/// GET /health
async fn health() -> Response {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ChatRequest {
    user_id: String,
    message: String,
}

/// POST /api/chat
async fn chat(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> Response {
    match state.chat.respond(&req.user_id, &req.message).await {
        Ok(reply) => Json(json!({
            "response": reply.content,
            "source": reply.source.as_str(),
        }))
        .into_response(),
        Err(ChatError::EmptyMessage) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "message must not be empty"})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "chat failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// DELETE /api/chat/history/{user_id}
async fn clear_chat_history(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.chat.clear_history(&user_id).await {
        Ok(()) => Json(json!({"success": true})).into_response(),
        Err(e) => {
            error!(error = %e, "clear_chat_history failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize, Default)]
struct ReportRequest {
    /// Student's display name; falls back to the user id.
    name: Option<String>,
}

/// POST /api/report/{user_id}
///
/// Generates a wellness report from the user's stored conversation,
/// scores it, and persists it.
async fn generate_report(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    body: Option<Json<ReportRequest>>,
) -> Response {
    let name = body
        .and_then(|Json(req)| req.name)
        .unwrap_or_else(|| user_id.clone());

    let transcript = match state.chat.transcript(&user_id, REPORT_TRANSCRIPT_TURNS).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "report transcript load failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    let mut report = match state.reports.generate(&name, &transcript).await {
        Ok(report) => report,
        Err(ReportError::EmptyTranscript) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "no conversation history to report on"})),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "report generation failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    // Scoring failure is not fatal; the report ships without a score.
    match state.reports.score(&transcript).await {
        Ok(score) => report.distress_score = Some(score),
        Err(e) => error!(error = %e, "distress scoring failed"),
    }

    if let Err(e) = state.db.insert_report(&user_id, &report).await {
        error!(error = %e, "report persistence failed");
    }

    info!(user_id, report_id = %report.id, "Report served");
    Json(report).into_response()
}

/// Build the full application router.
pub fn build_router(api: ApiState, journal: JournalRouteState) -> Router {
    let analytics = AnalyticsRouteState {
        db: Arc::clone(&api.db),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/chat/history/{user_id}", axum::routing::delete(clear_chat_history))
        .route("/api/report/{user_id}", post(generate_report))
        .with_state(api)
        .merge(journal_routes(journal))
        .merge(analytics_routes(analytics))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until shutdown.
pub async fn serve(app: Router, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!(port, "HTTP server started");
    axum::serve(listener, app).await
}

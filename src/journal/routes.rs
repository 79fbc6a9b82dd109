//! REST endpoints for journaling.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::journal::model::JournalEntryUpdate;
use crate::journal::service::JournalService;

const VALID_MOODS: &[&str] = &["😊", "😃", "😐", "😢"];

/// Shared state for journal routes.
#[derive(Clone)]
pub struct JournalRouteState {
    pub service: Arc<JournalService>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": message})),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": message})),
    )
        .into_response()
}

fn internal_error(context: &str, e: DatabaseError) -> Response {
    error!(error = %e, "{context} failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct CreateEntryRequest {
    user_id: String,
    mood: String,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    time_spent: i64,
}

/// POST /api/journal/entry
async fn create_entry(
    State(state): State<JournalRouteState>,
    Json(req): Json<CreateEntryRequest>,
) -> Response {
    if req.user_id.is_empty() {
        return bad_request("user_id is required");
    }
    if req.title.chars().count() < 3 {
        return bad_request("Title must be at least 3 characters");
    }
    if req.content.chars().count() < 10 {
        return bad_request("Content must be at least 10 characters");
    }
    if !VALID_MOODS.contains(&req.mood.as_str()) {
        return bad_request("Invalid mood emoji");
    }

    match state
        .service
        .create_entry(
            &req.user_id,
            &req.mood,
            &req.title,
            &req.content,
            req.tags,
            req.time_spent,
        )
        .await
    {
        Ok(outcome) => Json(json!({
            "success": true,
            "entry_id": outcome.entry_id,
            "message": "Journal entry saved successfully",
            "streak_updated": outcome.streak_updated,
            "current_streak": outcome.current_streak,
        }))
        .into_response(),
        Err(e) => internal_error("create_entry", e),
    }
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct RecentQuery {
    user_id: String,
    limit: Option<usize>,
}

/// GET /api/journal/recent-entries
async fn recent_entries(
    State(state): State<JournalRouteState>,
    Query(query): Query<RecentQuery>,
) -> Response {
    match state.service.recent(&query.user_id, query.limit).await {
        Ok(entries) => {
            let count = entries.len();
            Json(json!({"entries": entries, "count": count})).into_response()
        }
        Err(e) => internal_error("recent_entries", e),
    }
}

/// GET /api/journal/entry/{entry_id}
async fn get_entry(
    State(state): State<JournalRouteState>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.entry(entry_id, &query.user_id).await {
        Ok(Some(entry)) => Json(entry).into_response(),
        Ok(None) => not_found("Entry not found"),
        Err(e) => internal_error("get_entry", e),
    }
}

#[derive(Deserialize)]
struct UpdateEntryRequest {
    user_id: String,
    #[serde(flatten)]
    update: JournalEntryUpdate,
}

/// PUT /api/journal/entry/{entry_id}
async fn update_entry(
    State(state): State<JournalRouteState>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<UpdateEntryRequest>,
) -> Response {
    if let Some(mood) = &req.update.mood {
        if !VALID_MOODS.contains(&mood.as_str()) {
            return bad_request("Invalid mood emoji");
        }
    }
    match state
        .service
        .update_entry(entry_id, &req.user_id, &req.update)
        .await
    {
        Ok(true) => Json(json!({"success": true, "message": "Entry updated"})).into_response(),
        Ok(false) => not_found("Entry not found"),
        Err(e) => internal_error("update_entry", e),
    }
}

/// DELETE /api/journal/entry/{entry_id}
async fn delete_entry(
    State(state): State<JournalRouteState>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.delete_entry(entry_id, &query.user_id).await {
        Ok(true) => Json(json!({"success": true, "message": "Entry deleted"})).into_response(),
        Ok(false) => not_found("Entry not found"),
        Err(e) => internal_error("delete_entry", e),
    }
}

/// POST /api/journal/favorite/{entry_id}
async fn toggle_favorite(
    State(state): State<JournalRouteState>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.toggle_favorite(entry_id, &query.user_id).await {
        Ok(Some(is_favorite)) => Json(json!({
            "success": true,
            "is_favorite": is_favorite,
            "message": if is_favorite { "Added to favorites" } else { "Removed from favorites" },
        }))
        .into_response(),
        Ok(None) => not_found("Entry not found"),
        Err(e) => internal_error("toggle_favorite", e),
    }
}

/// GET /api/journal/favorites
async fn favorites(
    State(state): State<JournalRouteState>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.favorites(&query.user_id).await {
        Ok(entries) => {
            let count = entries.len();
            Json(json!({"favorites": entries, "count": count})).into_response()
        }
        Err(e) => internal_error("favorites", e),
    }
}

#[derive(Deserialize)]
struct ReflectionsQuery {
    user_id: String,
    /// ISO date (YYYY-MM-DD); today when omitted.
    date: Option<NaiveDate>,
}

/// GET /api/journal/past-reflections
async fn past_reflections(
    State(state): State<JournalRouteState>,
    Query(query): Query<ReflectionsQuery>,
) -> Response {
    match state.service.reflections(&query.user_id, query.date).await {
        Ok(day) => Json(day).into_response(),
        Err(e) => internal_error("past_reflections", e),
    }
}

#[derive(Deserialize)]
struct CalendarQuery {
    user_id: String,
    year: i32,
    month: u32,
}

/// GET /api/journal/calendar-data
async fn calendar_data(
    State(state): State<JournalRouteState>,
    Query(query): Query<CalendarQuery>,
) -> Response {
    if !(1..=12).contains(&query.month) {
        return bad_request("month must be 1-12");
    }
    match state
        .service
        .calendar(&query.user_id, query.year, query.month)
        .await
    {
        Ok(calendar) => Json(calendar).into_response(),
        Err(e) => internal_error("calendar_data", e),
    }
}

/// GET /api/journal/streak
async fn streak(
    State(state): State<JournalRouteState>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.current_streak(&query.user_id).await {
        Ok(current_streak) => Json(json!({
            "user_id": query.user_id,
            "current_streak": current_streak,
        }))
        .into_response(),
        Err(e) => internal_error("streak", e),
    }
}

/// GET /api/journal/daily-prompt
async fn daily_prompt(State(state): State<JournalRouteState>) -> Response {
    match state.service.daily_prompt().await {
        Ok(prompt) => Json(prompt).into_response(),
        Err(e) => internal_error("daily_prompt", e),
    }
}

/// GET /api/journal/stats
async fn stats(
    State(state): State<JournalRouteState>,
    Query(query): Query<UserQuery>,
) -> Response {
    match state.service.stats(&query.user_id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error("stats", e),
    }
}

/// Build the journaling REST routes.
pub fn journal_routes(state: JournalRouteState) -> Router {
    Router::new()
        .route("/api/journal/entry", post(create_entry))
        .route("/api/journal/recent-entries", get(recent_entries))
        .route(
            "/api/journal/entry/{entry_id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/journal/favorite/{entry_id}", post(toggle_favorite))
        .route("/api/journal/favorites", get(favorites))
        .route("/api/journal/past-reflections", get(past_reflections))
        .route("/api/journal/calendar-data", get(calendar_data))
        .route("/api/journal/streak", get(streak))
        .route("/api/journal/daily-prompt", get(daily_prompt))
        .route("/api/journal/stats", get(stats))
        .with_state(state)
}

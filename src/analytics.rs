//! Usage analytics endpoints — live active-user counts and a dashboard.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::error;

use crate::error::DatabaseError;
use crate::store::Database;

/// Shared state for analytics routes.
#[derive(Clone)]
pub struct AnalyticsRouteState {
    pub db: Arc<dyn Database>,
}

fn internal_error(context: &str, e: DatabaseError) -> Response {
    error!(error = %e, "{context} failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}

/// GET /analytics/active_users
///
/// Live activity windows: per-user details for the last 10 minutes, plus
/// distinct-user counts for the last hour and for today (UTC).
async fn active_users(State(state): State<AnalyticsRouteState>) -> Response {
    let now = Utc::now();

    let recent = match state.db.active_users_since(now - Duration::minutes(10)).await {
        Ok(users) => users,
        Err(e) => return internal_error("active_users", e),
    };
    let last_hour = match state.db.count_users_since(Some(now - Duration::hours(1))).await {
        Ok(n) => n,
        Err(e) => return internal_error("active_users", e),
    };
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|ndt| ndt.and_utc())
        .unwrap_or(now);
    let today = match state.db.count_users_since(Some(today_start)).await {
        Ok(n) => n,
        Err(e) => return internal_error("active_users", e),
    };

    Json(json!({
        "active_now": recent.len(),
        "active_last_hour": last_hour,
        "active_today": today,
        "timestamp": now,
        "details": recent.iter().map(|u| json!({
            "user_id": u.user_id,
            "last_activity": u.last_activity,
            "messages": u.message_count,
        })).collect::<Vec<_>>(),
    }))
    .into_response()
}

/// GET /analytics/dashboard
///
/// Totals plus the busiest hours of the last 7 days.
async fn dashboard(State(state): State<AnalyticsRouteState>) -> Response {
    let now = Utc::now();

    let total_users = match state.db.count_users_since(None).await {
        Ok(n) => n,
        Err(e) => return internal_error("dashboard", e),
    };
    let total_conversations = match state.db.count_chat_turns().await {
        Ok(n) => n,
        Err(e) => return internal_error("dashboard", e),
    };
    let total_reports = match state.db.count_reports().await {
        Ok(n) => n,
        Err(e) => return internal_error("dashboard", e),
    };
    let active_24h = match state.db.count_users_since(Some(now - Duration::hours(24))).await {
        Ok(n) => n,
        Err(e) => return internal_error("dashboard", e),
    };
    let peak_hours = match state.db.peak_hours(now - Duration::days(7), 5).await {
        Ok(hours) => hours,
        Err(e) => return internal_error("dashboard", e),
    };

    Json(json!({
        "total_users": total_users,
        "total_conversations": total_conversations,
        "total_reports": total_reports,
        "active_last_24h": active_24h,
        "peak_hours": peak_hours.iter().map(|h| json!({
            "hour": format!("{:02}:00", h.hour),
            "activity_count": h.count,
        })).collect::<Vec<_>>(),
        "timestamp": now,
    }))
    .into_response()
}

/// Build the analytics routes.
pub fn analytics_routes(state: AnalyticsRouteState) -> Router {
    Router::new()
        .route("/analytics/active_users", get(active_users))
        .route("/analytics/dashboard", get(dashboard))
        .with_state(state)
}

//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::journal::model::{DailyPrompt, JournalEntry, JournalEntryUpdate, JournalStreak, TagCount};
use crate::report::WellnessReport;

/// A persisted chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub id: Uuid,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A user active within an analytics window.
#[derive(Debug, Clone)]
pub struct ActiveUser {
    pub user_id: String,
    pub last_activity: DateTime<Utc>,
    pub message_count: u64,
}

/// Activity count bucketed by hour of day.
#[derive(Debug, Clone)]
pub struct HourActivity {
    pub hour: u32,
    pub count: u64,
}

/// Backend-agnostic database trait covering chat memory, journaling,
/// reports, and analytics queries.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Chat memory ─────────────────────────────────────────────────

    /// Append one turn to a user's conversation history.
    async fn append_chat_turn(
        &self,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), DatabaseError>;

    /// Most recent turns for a user, oldest first, up to `limit`.
    async fn chat_history(&self, user_id: &str, limit: usize)
        -> Result<Vec<ChatTurn>, DatabaseError>;

    /// Delete a user's conversation history.
    async fn clear_chat_history(&self, user_id: &str) -> Result<(), DatabaseError>;

    // ── Journal entries ─────────────────────────────────────────────

    async fn insert_journal_entry(&self, entry: &JournalEntry) -> Result<(), DatabaseError>;

    async fn get_journal_entry(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<JournalEntry>, DatabaseError>;

    /// Apply a partial update. Returns false if no row matched.
    async fn update_journal_entry(
        &self,
        id: Uuid,
        user_id: &str,
        update: &JournalEntryUpdate,
    ) -> Result<bool, DatabaseError>;

    /// Returns false if no row matched.
    async fn delete_journal_entry(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError>;

    /// Most recent entries, newest first.
    async fn recent_journal_entries(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, DatabaseError>;

    /// Set or clear the favorite flag. Returns false if no row matched.
    async fn set_journal_favorite(
        &self,
        id: Uuid,
        user_id: &str,
        favorite: bool,
    ) -> Result<bool, DatabaseError>;

    /// All favorite entries, most recently favorited first.
    async fn favorite_journal_entries(
        &self,
        user_id: &str,
    ) -> Result<Vec<JournalEntry>, DatabaseError>;

    /// Entries whose timestamp falls on the given UTC date, newest first.
    async fn journal_entries_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, DatabaseError>;

    /// (day, mood) pairs for every entry in [start, end). The service
    /// aggregates these into per-day counts and a dominant mood.
    async fn journal_day_moods(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, DatabaseError>;

    // ── Journal aggregates ──────────────────────────────────────────

    async fn count_journal_entries(&self, user_id: &str) -> Result<u64, DatabaseError>;

    async fn journal_mood_distribution(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, u64)>, DatabaseError>;

    async fn journal_top_tags(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TagCount>, DatabaseError>;

    async fn journal_total_time(&self, user_id: &str) -> Result<i64, DatabaseError>;

    // ── Streaks ─────────────────────────────────────────────────────

    async fn get_streak(&self, user_id: &str) -> Result<Option<JournalStreak>, DatabaseError>;

    async fn upsert_streak(&self, streak: &JournalStreak) -> Result<(), DatabaseError>;

    // ── Daily prompts ───────────────────────────────────────────────

    async fn active_prompts(&self) -> Result<Vec<DailyPrompt>, DatabaseError>;

    // ── Reports ─────────────────────────────────────────────────────

    async fn insert_report(&self, user_id: &str, report: &WellnessReport)
        -> Result<(), DatabaseError>;

    async fn count_reports(&self) -> Result<u64, DatabaseError>;

    // ── Analytics ───────────────────────────────────────────────────

    /// Users with chat activity since `since`, with last-seen time and
    /// message counts.
    async fn active_users_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActiveUser>, DatabaseError>;

    /// Distinct users with chat activity since `since` (all time if None).
    async fn count_users_since(&self, since: Option<DateTime<Utc>>) -> Result<u64, DatabaseError>;

    /// Total chat turns stored.
    async fn count_chat_turns(&self) -> Result<u64, DatabaseError>;

    /// Busiest hours of day since `since`, highest first, up to `limit`.
    async fn peak_hours(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HourActivity>, DatabaseError>;
}

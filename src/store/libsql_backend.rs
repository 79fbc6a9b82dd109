//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. A single connection is
//! reused for all operations; `libsql::Connection` is `Send + Sync` and
//! safe for concurrent async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::journal::model::{
    DailyPrompt, JournalEntry, JournalEntryUpdate, JournalStreak, TagCount,
};
use crate::report::WellnessReport;
use crate::store::migrations;
use crate::store::traits::{ActiveUser, ChatTurn, Database, HourActivity};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to open libSQL database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a JournalEntry.
///
/// Column order matches JOURNAL_COLUMNS:
/// 0:id, 1:user_id, 2:mood, 3:title, 4:content, 5:tags, 6:time_spent,
/// 7:is_favorite, 8:favorited_at, 9:timestamp, 10:created_at, 11:updated_at
fn row_to_journal_entry(row: &libsql::Row) -> Result<JournalEntry, libsql::Error> {
    let id_str: String = row.get(0)?;
    let tags_str: String = row.get(5)?;
    let favorited_str: Option<String> = row.get(8).ok();
    let timestamp_str: String = row.get(9)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;

    Ok(JournalEntry {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        user_id: row.get(1)?,
        mood: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        tags: serde_json::from_str(&tags_str).unwrap_or_default(),
        time_spent: row.get(6)?,
        is_favorite: row.get::<i64>(7)? != 0,
        favorited_at: parse_optional_datetime(&favorited_str),
        timestamp: parse_datetime(&timestamp_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

fn row_to_chat_turn(row: &libsql::Row) -> Result<ChatTurn, libsql::Error> {
    let id_str: String = row.get(0)?;
    let timestamp_str: String = row.get(4)?;
    Ok(ChatTurn {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        user_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        timestamp: parse_datetime(&timestamp_str),
    })
}

fn row_to_streak(row: &libsql::Row) -> Result<JournalStreak, libsql::Error> {
    let last_entry_str: Option<String> = row.get(2).ok();
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;
    Ok(JournalStreak {
        user_id: row.get(0)?,
        current_streak: row.get::<i64>(1)? as u32,
        last_entry_date: last_entry_str.as_deref().and_then(parse_date),
        longest_streak: row.get::<i64>(3)? as u32,
        total_days: row.get::<i64>(4)? as u32,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const JOURNAL_COLUMNS: &str = "id, user_id, mood, title, content, tags, time_spent, \
     is_favorite, favorited_at, timestamp, created_at, updated_at";

const CHAT_COLUMNS: &str = "id, user_id, role, content, timestamp";

const STREAK_COLUMNS: &str =
    "user_id, current_streak, last_entry_date, longest_streak, total_days, created_at, updated_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run(self.conn()).await
    }

    // ── Chat memory ─────────────────────────────────────────────────

    async fn append_chat_turn(
        &self,
        user_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO chat_messages (id, user_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id.to_string(), user_id, role, content, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("append_chat_turn: {e}")))?;

        debug!(user_id, role, "Chat turn appended");
        Ok(())
    }

    async fn chat_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, DatabaseError> {
        let conn = self.conn();
        // Newest `limit` turns, then re-ordered oldest first for the prompt.
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CHAT_COLUMNS} FROM chat_messages WHERE user_id = ?1 \
                     ORDER BY timestamp DESC LIMIT ?2"
                ),
                params![user_id, limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("chat_history: {e}")))?;

        let mut turns = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_chat_turn(&row) {
                Ok(turn) => turns.push(turn),
                Err(e) => tracing::warn!("Skipping chat row: {e}"),
            }
        }
        turns.reverse();
        Ok(turns)
    }

    async fn clear_chat_history(&self, user_id: &str) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM chat_messages WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("clear_chat_history: {e}")))?;

        if count > 0 {
            info!(user_id, count, "Chat history cleared");
        }
        Ok(())
    }

    // ── Journal entries ─────────────────────────────────────────────

    async fn insert_journal_entry(&self, entry: &JournalEntry) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let tags = serde_json::to_string(&entry.tags)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        conn.execute(
            "INSERT INTO journal_entries (id, user_id, mood, title, content, tags, time_spent, \
                 is_favorite, favorited_at, timestamp, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                entry.id.to_string(),
                entry.user_id.clone(),
                entry.mood.clone(),
                entry.title.clone(),
                entry.content.clone(),
                tags,
                entry.time_spent,
                entry.is_favorite as i64,
                opt_text_owned(entry.favorited_at.map(|dt| dt.to_rfc3339())),
                entry.timestamp.to_rfc3339(),
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_journal_entry: {e}")))?;

        debug!(entry_id = %entry.id, user_id = %entry.user_id, "Journal entry inserted");
        Ok(())
    }

    async fn get_journal_entry(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<JournalEntry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = ?1 AND user_id = ?2"
                ),
                params![id.to_string(), user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_journal_entry: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let entry = row_to_journal_entry(&row)
                    .map_err(|e| DatabaseError::Query(format!("journal row parse: {e}")))?;
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_journal_entry: {e}"))),
        }
    }

    async fn update_journal_entry(
        &self,
        id: Uuid,
        user_id: &str,
        update: &JournalEntryUpdate,
    ) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let tags = match &update.tags {
            Some(tags) => Some(
                serde_json::to_string(tags)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
            ),
            None => None,
        };
        let now = Utc::now().to_rfc3339();
        let count = conn
            .execute(
                "UPDATE journal_entries SET \
                     mood = COALESCE(?1, mood), \
                     title = COALESCE(?2, title), \
                     content = COALESCE(?3, content), \
                     tags = COALESCE(?4, tags), \
                     updated_at = ?5 \
                 WHERE id = ?6 AND user_id = ?7",
                params![
                    opt_text_owned(update.mood.clone()),
                    opt_text_owned(update.title.clone()),
                    opt_text_owned(update.content.clone()),
                    opt_text_owned(tags),
                    now,
                    id.to_string(),
                    user_id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_journal_entry: {e}")))?;

        Ok(count > 0)
    }

    async fn delete_journal_entry(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM journal_entries WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_journal_entry: {e}")))?;

        Ok(count > 0)
    }

    async fn recent_journal_entries(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE user_id = ?1 \
                     ORDER BY timestamp DESC LIMIT ?2"
                ),
                params![user_id, limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("recent_journal_entries: {e}")))?;

        let mut entries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_journal_entry(&row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping journal row: {e}"),
            }
        }
        Ok(entries)
    }

    async fn set_journal_favorite(
        &self,
        id: Uuid,
        user_id: &str,
        favorite: bool,
    ) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let favorited_at = if favorite {
            libsql::Value::Text(now.clone())
        } else {
            libsql::Value::Null
        };
        let count = conn
            .execute(
                "UPDATE journal_entries SET is_favorite = ?1, favorited_at = ?2, updated_at = ?3 \
                 WHERE id = ?4 AND user_id = ?5",
                params![favorite as i64, favorited_at, now, id.to_string(), user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_journal_favorite: {e}")))?;

        Ok(count > 0)
    }

    async fn favorite_journal_entries(
        &self,
        user_id: &str,
    ) -> Result<Vec<JournalEntry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {JOURNAL_COLUMNS} FROM journal_entries \
                     WHERE user_id = ?1 AND is_favorite = 1 \
                     ORDER BY favorited_at DESC"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("favorite_journal_entries: {e}")))?;

        let mut entries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_journal_entry(&row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping journal row: {e}"),
            }
        }
        Ok(entries)
    }

    async fn journal_entries_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, DatabaseError> {
        let conn = self.conn();
        // Timestamps are RFC 3339 in UTC, so the date is the first 10 chars.
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {JOURNAL_COLUMNS} FROM journal_entries \
                     WHERE user_id = ?1 AND substr(timestamp, 1, 10) = ?2 \
                     ORDER BY timestamp DESC"
                ),
                params![user_id, date.format("%Y-%m-%d").to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("journal_entries_on: {e}")))?;

        let mut entries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_journal_entry(&row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping journal row: {e}"),
            }
        }
        Ok(entries)
    }

    async fn journal_day_moods(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT substr(timestamp, 1, 10), mood FROM journal_entries \
                 WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3 \
                 ORDER BY timestamp ASC",
                params![user_id, start.to_rfc3339(), end.to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("journal_day_moods: {e}")))?;

        let mut pairs = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let day: String = row.get(0).unwrap_or_default();
            let mood: String = row.get(1).unwrap_or_default();
            pairs.push((day, mood));
        }
        Ok(pairs)
    }

    // ── Journal aggregates ──────────────────────────────────────────

    async fn count_journal_entries(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM journal_entries WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_journal_entries: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    async fn journal_mood_distribution(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, u64)>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT mood, COUNT(*) FROM journal_entries WHERE user_id = ?1 GROUP BY mood",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("journal_mood_distribution: {e}")))?;

        let mut moods = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let mood: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            moods.push((mood, count as u64));
        }
        Ok(moods)
    }

    async fn journal_top_tags(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TagCount>, DatabaseError> {
        let conn = self.conn();
        // Tags are stored as a JSON array column; unnest with json_each.
        let mut rows = conn
            .query(
                "SELECT je.value, COUNT(*) AS uses \
                 FROM journal_entries, json_each(journal_entries.tags) AS je \
                 WHERE user_id = ?1 \
                 GROUP BY je.value ORDER BY uses DESC LIMIT ?2",
                params![user_id, limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("journal_top_tags: {e}")))?;

        let mut tags = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let tag: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            tags.push(TagCount {
                tag,
                count: count as u64,
            });
        }
        Ok(tags)
    }

    async fn journal_total_time(&self, user_id: &str) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT COALESCE(SUM(time_spent), 0) FROM journal_entries WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("journal_total_time: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0)),
            _ => Ok(0),
        }
    }

    // ── Streaks ─────────────────────────────────────────────────────

    async fn get_streak(&self, user_id: &str) -> Result<Option<JournalStreak>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {STREAK_COLUMNS} FROM journal_streaks WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_streak: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let streak = row_to_streak(&row)
                    .map_err(|e| DatabaseError::Query(format!("streak row parse: {e}")))?;
                Ok(Some(streak))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_streak: {e}"))),
        }
    }

    async fn upsert_streak(&self, streak: &JournalStreak) -> Result<(), DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO journal_streaks (user_id, current_streak, last_entry_date, \
                 longest_streak, total_days, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 current_streak = excluded.current_streak, \
                 last_entry_date = excluded.last_entry_date, \
                 longest_streak = excluded.longest_streak, \
                 total_days = excluded.total_days, \
                 updated_at = excluded.updated_at",
            params![
                streak.user_id.clone(),
                streak.current_streak as i64,
                opt_text_owned(
                    streak
                        .last_entry_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                ),
                streak.longest_streak as i64,
                streak.total_days as i64,
                streak.created_at.to_rfc3339(),
                streak.updated_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("upsert_streak: {e}")))?;

        debug!(user_id = %streak.user_id, current = streak.current_streak, "Streak upserted");
        Ok(())
    }

    // ── Daily prompts ───────────────────────────────────────────────

    async fn active_prompts(&self) -> Result<Vec<DailyPrompt>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT prompt_id, text, category, active FROM daily_prompts WHERE active = 1",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("active_prompts: {e}")))?;

        let mut prompts = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            prompts.push(DailyPrompt {
                prompt_id: row.get(0).unwrap_or_default(),
                text: row.get(1).unwrap_or_default(),
                category: row.get(2).unwrap_or_default(),
                active: row.get::<i64>(3).unwrap_or(1) != 0,
            });
        }
        Ok(prompts)
    }

    // ── Reports ─────────────────────────────────────────────────────

    async fn insert_report(
        &self,
        user_id: &str,
        report: &WellnessReport,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let sections = serde_json::to_string(&report.sections)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let score: libsql::Value = match &report.distress_score {
            Some(s) => libsql::Value::Integer(s.value as i64),
            None => libsql::Value::Null,
        };
        conn.execute(
            "INSERT INTO reports (id, user_id, name, generated_at, sections, distress_score) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.id.to_string(),
                user_id,
                report.name.clone(),
                report.generated_at.to_rfc3339(),
                sections,
                score,
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_report: {e}")))?;

        debug!(report_id = %report.id, user_id, "Report inserted");
        Ok(())
    }

    async fn count_reports(&self) -> Result<u64, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM reports", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("count_reports: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    // ── Analytics ───────────────────────────────────────────────────

    async fn active_users_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActiveUser>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT user_id, MAX(timestamp), COUNT(*) FROM chat_messages \
                 WHERE timestamp >= ?1 GROUP BY user_id ORDER BY MAX(timestamp) DESC",
                params![since.to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("active_users_since: {e}")))?;

        let mut users = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let user_id: String = row.get(0).unwrap_or_default();
            let last_str: String = row.get(1).unwrap_or_default();
            let count: i64 = row.get(2).unwrap_or(0);
            users.push(ActiveUser {
                user_id,
                last_activity: parse_datetime(&last_str),
                message_count: count as u64,
            });
        }
        Ok(users)
    }

    async fn count_users_since(&self, since: Option<DateTime<Utc>>) -> Result<u64, DatabaseError> {
        let conn = self.conn();
        let mut rows = if let Some(since) = since {
            conn.query(
                "SELECT COUNT(DISTINCT user_id) FROM chat_messages WHERE timestamp >= ?1",
                params![since.to_rfc3339()],
            )
            .await
        } else {
            conn.query("SELECT COUNT(DISTINCT user_id) FROM chat_messages", ())
                .await
        }
        .map_err(|e| DatabaseError::Query(format!("count_users_since: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    async fn count_chat_turns(&self) -> Result<u64, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM chat_messages", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("count_chat_turns: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    async fn peak_hours(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HourActivity>, DatabaseError> {
        let conn = self.conn();
        // RFC 3339 in UTC: chars 12-13 are the hour of day.
        let mut rows = conn
            .query(
                "SELECT CAST(substr(timestamp, 12, 2) AS INTEGER) AS hour, COUNT(*) AS n \
                 FROM chat_messages WHERE timestamp >= ?1 \
                 GROUP BY hour ORDER BY n DESC LIMIT ?2",
                params![since.to_rfc3339(), limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("peak_hours: {e}")))?;

        let mut hours = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let hour: i64 = row.get(0).unwrap_or(0);
            let count: i64 = row.get(1).unwrap_or(0);
            hours.push(HourActivity {
                hour: hour as u32,
                count: count as u64,
            });
        }
        Ok(hours)
    }
}

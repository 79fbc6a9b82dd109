//! Journaling service — entries, streaks, prompts, calendar, stats.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::JournalConfig;
use crate::error::DatabaseError;
use crate::journal::model::{
    CalendarDay, DailyPrompt, JournalEntry, JournalEntryUpdate, JournalStats, JournalStreak,
};
use crate::store::Database;

/// A listed entry with presentation fields.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub id: Uuid,
    /// "Today, 05:20 PM" style label.
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub preview: String,
    pub mood: String,
    pub tags: Vec<String>,
    pub time_spent: i64,
    pub is_favorite: bool,
}

/// Result of creating an entry.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEntryOutcome {
    pub entry_id: Uuid,
    pub streak_updated: bool,
    pub current_streak: u32,
}

/// All entries written on one date.
#[derive(Debug, Clone, Serialize)]
pub struct DayReflections {
    pub date: NaiveDate,
    pub entries: Vec<EntrySummary>,
    pub total_entries: usize,
    pub total_time_spent: i64,
}

/// One month's journaling calendar.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    /// "YYYY-MM".
    pub month: String,
    pub dates_with_entries: Vec<CalendarDay>,
}

const PREVIEW_LENGTH: usize = 150;

/// Journaling over the `Database` trait. Date-sensitive operations take an
/// explicit `today` internally so the streak rules stay clock-testable.
pub struct JournalService {
    db: Arc<dyn Database>,
    config: JournalConfig,
}

impl JournalService {
    pub fn new(db: Arc<dyn Database>, config: JournalConfig) -> Self {
        Self { db, config }
    }

    /// Create an entry and update the streak when it qualifies.
    pub async fn create_entry(
        &self,
        user_id: &str,
        mood: &str,
        title: &str,
        content: &str,
        tags: Vec<String>,
        time_spent: i64,
    ) -> Result<CreateEntryOutcome, DatabaseError> {
        let entry = JournalEntry::new(user_id, mood, title, content, tags, time_spent);
        self.db.insert_journal_entry(&entry).await?;

        let today = Utc::now().date_naive();
        let streak_updated = self.update_streak(user_id, time_spent, today).await?;
        let current_streak = self.current_streak_on(user_id, today).await?;

        info!(user_id, entry_id = %entry.id, streak_updated, "Journal entry created");
        Ok(CreateEntryOutcome {
            entry_id: entry.id,
            streak_updated,
            current_streak,
        })
    }

    pub async fn entry(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<JournalEntry>, DatabaseError> {
        self.db.get_journal_entry(id, user_id).await
    }

    pub async fn update_entry(
        &self,
        id: Uuid,
        user_id: &str,
        update: &JournalEntryUpdate,
    ) -> Result<bool, DatabaseError> {
        self.db.update_journal_entry(id, user_id, update).await
    }

    pub async fn delete_entry(&self, id: Uuid, user_id: &str) -> Result<bool, DatabaseError> {
        self.db.delete_journal_entry(id, user_id).await
    }

    /// Most recent entries with display formatting, newest first.
    pub async fn recent(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<EntrySummary>, DatabaseError> {
        let limit = limit.unwrap_or(self.config.recent_limit);
        let entries = self.db.recent_journal_entries(user_id, limit).await?;
        let today = Utc::now().date_naive();
        Ok(entries.iter().map(|e| summarize(e, today)).collect())
    }

    /// Flip the favorite flag. Returns the new state, None if not found.
    pub async fn toggle_favorite(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<bool>, DatabaseError> {
        let Some(entry) = self.db.get_journal_entry(id, user_id).await? else {
            return Ok(None);
        };
        let new_state = !entry.is_favorite;
        self.db.set_journal_favorite(id, user_id, new_state).await?;
        Ok(Some(new_state))
    }

    pub async fn favorites(&self, user_id: &str) -> Result<Vec<EntrySummary>, DatabaseError> {
        let entries = self.db.favorite_journal_entries(user_id).await?;
        let today = Utc::now().date_naive();
        Ok(entries.iter().map(|e| summarize(e, today)).collect())
    }

    /// All entries written on a date (defaults to today).
    pub async fn reflections(
        &self,
        user_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<DayReflections, DatabaseError> {
        let today = Utc::now().date_naive();
        let date = date.unwrap_or(today);
        let entries = self.db.journal_entries_on(user_id, date).await?;
        let total_time_spent = entries.iter().map(|e| e.time_spent).sum();
        let entries: Vec<EntrySummary> = entries.iter().map(|e| summarize(e, today)).collect();
        Ok(DayReflections {
            date,
            total_entries: entries.len(),
            total_time_spent,
            entries,
        })
    }

    /// Which dates of a month have entries, with counts and dominant mood.
    pub async fn calendar(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<CalendarMonth, DatabaseError> {
        let start = first_of_month(year, month)?;
        let end = if month == 12 {
            first_of_month(year + 1, 1)?
        } else {
            first_of_month(year, month + 1)?
        };

        let pairs = self.db.journal_day_moods(user_id, start, end).await?;

        let mut by_day: HashMap<String, Vec<String>> = HashMap::new();
        for (day, mood) in pairs {
            by_day.entry(day).or_default().push(mood);
        }

        let mut dates_with_entries: Vec<CalendarDay> = by_day
            .into_iter()
            .map(|(date, moods)| CalendarDay {
                count: moods.len() as u64,
                mood: dominant_mood(&moods),
                date,
            })
            .collect();
        dates_with_entries.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(CalendarMonth {
            month: format!("{year}-{month:02}"),
            dates_with_entries,
        })
    }

    /// Current streak, 0 when the last entry is older than yesterday.
    pub async fn current_streak(&self, user_id: &str) -> Result<u32, DatabaseError> {
        self.current_streak_on(user_id, Utc::now().date_naive()).await
    }

    async fn current_streak_on(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<u32, DatabaseError> {
        let Some(streak) = self.db.get_streak(user_id).await? else {
            return Ok(0);
        };
        Ok(valid_streak(&streak, today))
    }

    /// Apply the streak rules for a qualifying entry written `today`.
    /// Returns false when the entry was too short or today already counted.
    pub async fn update_streak(
        &self,
        user_id: &str,
        time_spent: i64,
        today: NaiveDate,
    ) -> Result<bool, DatabaseError> {
        if time_spent < self.config.streak_min_seconds {
            return Ok(false);
        }

        let existing = self.db.get_streak(user_id).await?;
        match advance_streak(existing, user_id, today) {
            Some(updated) => {
                self.db.upsert_streak(&updated).await?;
                info!(user_id, streak = updated.current_streak, "Streak updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// A random active daily prompt, with a default when none are seeded.
    pub async fn daily_prompt(&self) -> Result<DailyPrompt, DatabaseError> {
        let prompts = self.db.active_prompts().await?;
        match prompts.choose(&mut rand::thread_rng()) {
            Some(prompt) => Ok(prompt.clone()),
            None => {
                warn!("No active daily prompts, serving default");
                Ok(DailyPrompt {
                    prompt_id: "default".into(),
                    text: "How are you feeling today?".into(),
                    category: "reflection".into(),
                    active: true,
                })
            }
        }
    }

    /// Aggregate statistics for a user.
    pub async fn stats(&self, user_id: &str) -> Result<JournalStats, DatabaseError> {
        let total_entries = self.db.count_journal_entries(user_id).await?;
        let streak = self.db.get_streak(user_id).await?;
        let today = Utc::now().date_naive();
        let current_streak = streak.as_ref().map(|s| valid_streak(s, today)).unwrap_or(0);
        let longest_streak = streak.as_ref().map(|s| s.longest_streak).unwrap_or(0);
        let total_days = streak.as_ref().map(|s| s.total_days).unwrap_or(0);

        let mood_distribution = self
            .db
            .journal_mood_distribution(user_id)
            .await?
            .into_iter()
            .collect();
        let most_used_tags = self.db.journal_top_tags(user_id, 10).await?;
        let total_time_spent = self.db.journal_total_time(user_id).await?;
        let average_time_per_entry = if total_entries > 0 {
            total_time_spent / total_entries as i64
        } else {
            0
        };

        Ok(JournalStats {
            total_entries,
            current_streak,
            longest_streak,
            total_days,
            mood_distribution,
            most_used_tags,
            total_time_spent,
            average_time_per_entry,
        })
    }
}

/// Streak transition for a qualifying entry on `today`. None means today
/// was already counted and nothing changes.
fn advance_streak(
    existing: Option<JournalStreak>,
    user_id: &str,
    today: NaiveDate,
) -> Option<JournalStreak> {
    let Some(mut streak) = existing else {
        return Some(JournalStreak::started(user_id, today));
    };

    if streak.last_entry_date == Some(today) {
        return None;
    }

    let yesterday = today - Duration::days(1);
    streak.current_streak = if streak.last_entry_date == Some(yesterday) {
        streak.current_streak + 1
    } else {
        1
    };
    streak.longest_streak = streak.longest_streak.max(streak.current_streak);
    streak.total_days += 1;
    streak.last_entry_date = Some(today);
    streak.updated_at = Utc::now();
    Some(streak)
}

/// A streak only reads as live while its last entry is today or yesterday.
fn valid_streak(streak: &JournalStreak, today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);
    match streak.last_entry_date {
        Some(date) if date == today || date == yesterday => streak.current_streak,
        _ => 0,
    }
}

/// "Today, 05:20 PM" / "Yesterday, 05:20 PM" / "Sat Dec 21, 09:20 AM".
fn format_date(timestamp: DateTime<Utc>, today: NaiveDate) -> String {
    let days = (today - timestamp.date_naive()).num_days();
    match days {
        0 => format!("Today, {}", timestamp.format("%I:%M %p")),
        1 => format!("Yesterday, {}", timestamp.format("%I:%M %p")),
        _ => timestamp.format("%a %b %d, %I:%M %p").to_string(),
    }
}

fn summarize(entry: &JournalEntry, today: NaiveDate) -> EntrySummary {
    EntrySummary {
        id: entry.id,
        date: format_date(entry.timestamp, today),
        timestamp: entry.timestamp,
        title: entry.title.clone(),
        preview: entry.preview(PREVIEW_LENGTH),
        mood: entry.mood.clone(),
        tags: entry.tags.clone(),
        time_spent: entry.time_spent,
        is_favorite: entry.is_favorite,
    }
}

/// Most common mood in a day's entries.
fn dominant_mood(moods: &[String]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for mood in moods {
        *counts.entry(mood.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(mood, _)| mood.to_string())
        .unwrap_or_else(|| "😐".to_string())
}

fn first_of_month(year: i32, month: u32) -> Result<DateTime<Utc>, DatabaseError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| DatabaseError::Query(format!("invalid month {year}-{month:02}")))
}

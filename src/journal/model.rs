//! Data models for the journaling feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: String,
    /// Mood emoji: 😊 😃 😐 😢
    pub mood: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Time spent writing, in seconds.
    pub time_spent: i64,
    pub is_favorite: bool,
    pub favorited_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        user_id: &str,
        mood: &str,
        title: &str,
        content: &str,
        tags: Vec<String>,
        time_spent: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            mood: mood.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags,
            time_spent,
            is_favorite: false,
            favorited_at: None,
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Preview text for list views, truncated at a word boundary.
    pub fn preview(&self, max_length: usize) -> String {
        if self.content.len() <= max_length {
            return self.content.clone();
        }
        let cut = &self.content[..self
            .content
            .char_indices()
            .take_while(|(i, _)| *i < max_length)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0)];
        match cut.rsplit_once(' ') {
            Some((head, _)) => format!("{head}..."),
            None => format!("{cut}..."),
        }
    }
}

/// Fields that can change on an existing entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalEntryUpdate {
    pub mood: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A user's journaling streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalStreak {
    pub user_id: String,
    pub current_streak: u32,
    pub last_entry_date: Option<chrono::NaiveDate>,
    pub longest_streak: u32,
    pub total_days: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalStreak {
    /// A fresh streak record starting today.
    pub fn started(user_id: &str, today: chrono::NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            current_streak: 1,
            last_entry_date: Some(today),
            longest_streak: 1,
            total_days: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A daily journaling prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPrompt {
    pub prompt_id: String,
    pub text: String,
    /// reflection, gratitude, goals, emotions
    pub category: String,
    pub active: bool,
}

/// Aggregate journaling statistics for a user.
#[derive(Debug, Clone, Serialize)]
pub struct JournalStats {
    pub total_entries: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    pub mood_distribution: std::collections::HashMap<String, u64>,
    pub most_used_tags: Vec<TagCount>,
    /// Total seconds spent journaling.
    pub total_time_spent: i64,
    pub average_time_per_entry: i64,
}

/// A tag with its usage count.
#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// One calendar day with entries.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    /// ISO date (YYYY-MM-DD).
    pub date: String,
    pub count: u64,
    /// Most common mood that day.
    pub mood: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_content_unchanged() {
        let entry = JournalEntry::new("u1", "😊", "t", "short note", vec![], 0);
        assert_eq!(entry.preview(150), "short note");
    }

    #[test]
    fn preview_truncates_at_word_boundary() {
        let content = "one two three four five six seven";
        let entry = JournalEntry::new("u1", "😊", "t", content, vec![], 0);
        let preview = entry.preview(12);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 15);
        assert!(!preview.contains("three four"));
    }
}

//! Integration tests for the libSQL backend through the `Database` trait.

use chrono::{Duration, Utc};
use uuid::Uuid;

use zenark::journal::model::{JournalEntry, JournalEntryUpdate, JournalStreak};
use zenark::report::{ReportSection, WellnessReport};
use zenark::store::{Database, LibSqlBackend};

async fn backend() -> LibSqlBackend {
    LibSqlBackend::new_memory().await.expect("in-memory db")
}

fn entry(user_id: &str, title: &str) -> JournalEntry {
    JournalEntry::new(
        user_id,
        "😊",
        title,
        "a reflection long enough to matter",
        vec!["#calm".into()],
        320,
    )
}

#[tokio::test]
async fn journal_entry_crud_roundtrip() {
    let db = backend().await;
    let original = entry("u1", "first entry");
    db.insert_journal_entry(&original).await.unwrap();

    let loaded = db
        .get_journal_entry(original.id, "u1")
        .await
        .unwrap()
        .expect("entry exists");
    assert_eq!(loaded.title, "first entry");
    assert_eq!(loaded.mood, "😊");
    assert_eq!(loaded.tags, vec!["#calm".to_string()]);
    assert_eq!(loaded.time_spent, 320);
    assert!(!loaded.is_favorite);

    // Wrong user never sees it.
    assert!(db.get_journal_entry(original.id, "u2").await.unwrap().is_none());

    let update = JournalEntryUpdate {
        title: Some("renamed".into()),
        tags: Some(vec!["#calm".into(), "#work".into()]),
        ..JournalEntryUpdate::default()
    };
    assert!(db.update_journal_entry(original.id, "u1", &update).await.unwrap());

    let loaded = db
        .get_journal_entry(original.id, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.title, "renamed");
    assert_eq!(loaded.content, original.content);
    assert_eq!(loaded.tags.len(), 2);

    assert!(db.delete_journal_entry(original.id, "u1").await.unwrap());
    assert!(!db.delete_journal_entry(original.id, "u1").await.unwrap());
    assert!(db.get_journal_entry(original.id, "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn favorites_are_flagged_and_listed() {
    let db = backend().await;
    let keeper = entry("u1", "keeper");
    let other = entry("u1", "other");
    db.insert_journal_entry(&keeper).await.unwrap();
    db.insert_journal_entry(&other).await.unwrap();

    assert!(db.set_journal_favorite(keeper.id, "u1", true).await.unwrap());
    let favorites = db.favorite_journal_entries("u1").await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, keeper.id);
    assert!(favorites[0].favorited_at.is_some());

    assert!(db.set_journal_favorite(keeper.id, "u1", false).await.unwrap());
    assert!(db.favorite_journal_entries("u1").await.unwrap().is_empty());

    // Unknown id matches nothing.
    assert!(!db.set_journal_favorite(Uuid::new_v4(), "u1", true).await.unwrap());
}

#[tokio::test]
async fn entries_query_by_day() {
    let db = backend().await;
    db.insert_journal_entry(&entry("u1", "today a")).await.unwrap();
    db.insert_journal_entry(&entry("u1", "today b")).await.unwrap();
    db.insert_journal_entry(&entry("u2", "someone else")).await.unwrap();

    let today = Utc::now().date_naive();
    let entries = db.journal_entries_on("u1", today).await.unwrap();
    assert_eq!(entries.len(), 2);

    let yesterday = today - Duration::days(1);
    assert!(db.journal_entries_on("u1", yesterday).await.unwrap().is_empty());

    let moods = db
        .journal_day_moods("u1", Utc::now() - Duration::days(1), Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(moods.len(), 2);
    assert!(moods.iter().all(|(day, mood)| day.len() == 10 && mood == "😊"));
}

#[tokio::test]
async fn chat_history_is_ordered_and_limited() {
    let db = backend().await;
    for i in 1..=5 {
        db.append_chat_turn("u1", "user", &format!("message {i}"))
            .await
            .unwrap();
    }

    let turns = db.chat_history("u1", 3).await.unwrap();
    assert_eq!(turns.len(), 3);
    // Oldest first within the newest three.
    assert_eq!(turns[0].content, "message 3");
    assert_eq!(turns[2].content, "message 5");

    db.clear_chat_history("u1").await.unwrap();
    assert!(db.chat_history("u1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn streak_upsert_roundtrip() {
    let db = backend().await;
    assert!(db.get_streak("u1").await.unwrap().is_none());

    let today = Utc::now().date_naive();
    let mut streak = JournalStreak::started("u1", today);
    db.upsert_streak(&streak).await.unwrap();

    let loaded = db.get_streak("u1").await.unwrap().unwrap();
    assert_eq!(loaded.current_streak, 1);
    assert_eq!(loaded.last_entry_date, Some(today));

    streak.current_streak = 4;
    streak.longest_streak = 4;
    streak.total_days = 6;
    db.upsert_streak(&streak).await.unwrap();

    let loaded = db.get_streak("u1").await.unwrap().unwrap();
    assert_eq!(loaded.current_streak, 4);
    assert_eq!(loaded.longest_streak, 4);
    assert_eq!(loaded.total_days, 6);
}

#[tokio::test]
async fn seeded_prompts_are_active() {
    let db = backend().await;
    let prompts = db.active_prompts().await.unwrap();
    assert_eq!(prompts.len(), 10);
    assert!(prompts.iter().all(|p| p.active));
    assert!(prompts.iter().any(|p| p.category == "gratitude"));
}

#[tokio::test]
async fn reports_persist_and_count() {
    let db = backend().await;
    assert_eq!(db.count_reports().await.unwrap(), 0);

    let report = WellnessReport::new(
        "Asha",
        vec![ReportSection {
            name: "TherapistAgent".into(),
            content: "Take a breath.".into(),
        }],
    );
    db.insert_report("u1", &report).await.unwrap();
    assert_eq!(db.count_reports().await.unwrap(), 1);
}

#[tokio::test]
async fn analytics_counts_distinct_users() {
    let db = backend().await;
    db.append_chat_turn("u1", "user", "hello").await.unwrap();
    db.append_chat_turn("u1", "assistant", "hi there").await.unwrap();
    db.append_chat_turn("u2", "user", "hey").await.unwrap();

    assert_eq!(db.count_chat_turns().await.unwrap(), 3);
    assert_eq!(db.count_users_since(None).await.unwrap(), 2);

    let recent = db
        .active_users_since(Utc::now() - Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    let u1 = recent.iter().find(|u| u.user_id == "u1").unwrap();
    assert_eq!(u1.message_count, 2);

    let peaks = db
        .peak_hours(Utc::now() - Duration::days(7), 5)
        .await
        .unwrap();
    assert!(!peaks.is_empty());
    assert_eq!(peaks.iter().map(|h| h.count).sum::<u64>(), 3);
}

#[tokio::test]
async fn database_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zenark.db");

    {
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        db.insert_journal_entry(&entry("u1", "persisted")).await.unwrap();
    }

    let db = LibSqlBackend::new_local(&path).await.unwrap();
    let entries = db.recent_journal_entries("u1", 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "persisted");
}

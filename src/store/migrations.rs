//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run()` checks the current
//! version and applies only the new ones sequentially.

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_messages_user ON chat_messages(user_id);
            CREATE INDEX IF NOT EXISTS idx_chat_messages_timestamp ON chat_messages(timestamp);

            CREATE TABLE IF NOT EXISTS journal_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                mood TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                time_spent INTEGER NOT NULL DEFAULT 0,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                favorited_at TEXT,
                timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_journal_entries_user ON journal_entries(user_id);
            CREATE INDEX IF NOT EXISTS idx_journal_entries_user_timestamp
                ON journal_entries(user_id, timestamp DESC);
            CREATE INDEX IF NOT EXISTS idx_journal_entries_user_favorite
                ON journal_entries(user_id, is_favorite);

            CREATE TABLE IF NOT EXISTS journal_streaks (
                user_id TEXT PRIMARY KEY,
                current_streak INTEGER NOT NULL DEFAULT 0,
                last_entry_date TEXT,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                total_days INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_prompts (
                prompt_id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                category TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_daily_prompts_active ON daily_prompts(active);

            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                sections TEXT NOT NULL,
                distress_score INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id);
        "#,
    },
    Migration {
        version: 2,
        name: "seed_daily_prompts",
        sql: r#"
            INSERT OR IGNORE INTO daily_prompts (prompt_id, text, category, active) VALUES
                ('prompt_001', 'What is one small thing you can control today?', 'reflection', 1),
                ('prompt_002', 'What are three things you''re grateful for right now?', 'gratitude', 1),
                ('prompt_003', 'What emotion are you feeling most strongly today, and why?', 'emotions', 1),
                ('prompt_004', 'What is one goal you want to accomplish this week?', 'goals', 1),
                ('prompt_005', 'Describe a moment today that made you smile.', 'reflection', 1),
                ('prompt_006', 'What challenge are you facing, and what''s one step you can take?', 'reflection', 1),
                ('prompt_007', 'Who in your life are you thankful for, and why?', 'gratitude', 1),
                ('prompt_008', 'What does success look like for you today?', 'goals', 1),
                ('prompt_009', 'How are you taking care of yourself today?', 'reflection', 1),
                ('prompt_010', 'What lesson did you learn recently?', 'reflection', 1);
        "#,
    },
];

/// Apply all pending migrations.
pub async fn run(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create migrations table: {e}")))?;

    let current = current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.sql)
            .await
            .map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration v{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| {
            DatabaseError::Migration(format!(
                "Failed to record migration v{}: {e}",
                migration.version
            ))
        })?;

        info!(version = migration.version, name = migration.name, "Applied migration");
    }

    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(e.to_string())),
        None => Ok(0),
    }
}

//! Journaling — mood-tagged entries, streaks, daily prompts, statistics.

pub mod model;
pub mod routes;
pub mod service;

pub use model::{DailyPrompt, JournalEntry, JournalEntryUpdate, JournalStats, JournalStreak};
pub use routes::{JournalRouteState, journal_routes};
pub use service::JournalService;

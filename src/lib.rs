//! Zenark — a conversational mental-wellness service for students.
//!
//! The core is a rate-limited admission queue that paces all LLM calls to a
//! fixed per-minute budget, plus a fallback policy that serves canned
//! responses for greetings, crisis messages, heavy load, and model failures.
//! Around it: exam-guidance chat with persistent memory, journaling with
//! streaks, multi-part wellness reports, and usage analytics.

pub mod analytics;
pub mod chat;
pub mod config;
pub mod error;
pub mod fallback;
pub mod journal;
pub mod llm;
pub mod queue;
pub mod report;
pub mod server;
pub mod store;

pub use error::{Error, Result};

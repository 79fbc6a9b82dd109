//! Configuration types.

use std::time::Duration;

/// Pacing configuration for the rate-limited request queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum LLM requests started within any trailing window.
    pub max_requests_per_window: usize,
    /// Length of the trailing rate window.
    pub window: Duration,
    /// Upper bound on how long the pacing loop sleeps before re-checking
    /// capacity, even if the computed wait is longer.
    pub poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 3,
            window: Duration::from_secs(60),
            poll_interval: Duration::from_secs(20), // window / max_rpm
        }
    }
}

/// Fallback/bypass policy configuration.
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Pending-queue depth above which requests are load-shed to canned
    /// responses.
    pub queue_depth_threshold: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            queue_depth_threshold: 5,
        }
    }
}

/// Chat service configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// LLM temperature for chat responses.
    pub temperature: f32,
    /// Max tokens for a chat response.
    pub max_tokens: u32,
    /// How many prior conversation turns to include in the prompt.
    pub history_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            history_turns: 20,
        }
    }
}

/// Report generator configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Maximum transcript characters fed to each section prompt.
    pub transcript_limit: usize,
    /// LLM temperature for report sections.
    pub temperature: f32,
    /// Max tokens per report section.
    pub max_tokens: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            transcript_limit: 3000,
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// Journaling configuration.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Minimum seconds spent on an entry for it to count toward the streak.
    pub streak_min_seconds: i64,
    /// Default number of recent entries returned.
    pub recent_limit: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            streak_min_seconds: 300, // 5 minutes
            recent_limit: 5,
        }
    }
}

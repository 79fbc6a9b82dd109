//! Fallback policy — keyword classification and LLM bypass decisions.
//!
//! Runs before the rate-limited call path to short-circuit the cases that
//! should never spend model quota:
//! - bare greetings → canned greeting
//! - crisis phrases → canned helpline response, immediately, never queued
//! - deep pending queue → canned high-traffic response (load shedding)
//!
//! Classification is a static ordered table of (keyword group, category)
//! pairs, case-insensitive substring match, first match wins.

use rand::seq::SliceRandom;
use tracing::debug;

use crate::config::FallbackConfig;

/// Canned-response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Greeting,
    ExamStress,
    SleepIssues,
    StudyTips,
    Motivation,
    Crisis,
    Goodbye,
    HighTraffic,
    Default,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::ExamStress => "exam_stress",
            Category::SleepIssues => "sleep_issues",
            Category::StudyTips => "study_tips",
            Category::Motivation => "motivation",
            Category::Crisis => "crisis",
            Category::Goodbye => "goodbye",
            Category::HighTraffic => "high_traffic",
            Category::Default => "default",
        }
    }
}

/// Ordered keyword groups for classification. Checked top to bottom; the
/// first group with a matching keyword wins.
static KEYWORD_GROUPS: &[(&[&str], Category)] = &[
    (&["hi", "hello", "hey", "heya", "sup", "yo"], Category::Greeting),
    (
        &["exam", "test", "quiz", "marks", "fail", "score"],
        Category::ExamStress,
    ),
    (
        &["sleep", "insomnia", "tired", "exhausted", "can't sleep"],
        Category::SleepIssues,
    ),
    (
        &["study", "focus", "concentrate", "learn", "remember"],
        Category::StudyTips,
    ),
    (
        &["motivat", "give up", "quit", "can't do", "too hard"],
        Category::Motivation,
    ),
    (
        &["suicide", "kill myself", "end it", "die", "harm"],
        Category::Crisis,
    ),
    (
        &["bye", "goodbye", "thanks", "thank you", "see you"],
        Category::Goodbye,
    ),
];

/// Greeting tokens that bypass the LLM when they are the entire message.
static GREETING_TOKENS: &[&str] = &["hi", "hello", "hey", "heya", "sup", "yo"];

/// Crisis phrases that always bypass the queue — a safety response must
/// never wait behind other traffic.
static CRISIS_PHRASES: &[&str] = &["suicide", "kill myself", "end it all"];

/// Why a message bypassed the paced call path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    Greeting,
    Crisis,
    HighTraffic,
}

/// The fallback decision policy. Pure: no clock, no I/O.
pub struct FallbackPolicy {
    config: FallbackConfig,
}

impl FallbackPolicy {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Classify a message into a canned-response category.
    pub fn classify(&self, message: &str) -> Category {
        let lower = message.to_lowercase();
        for (keywords, category) in KEYWORD_GROUPS {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                return *category;
            }
        }
        Category::Default
    }

    /// Decide whether this message should skip the rate-limited call path,
    /// and why. Crisis detection runs before the load check — it must hold
    /// regardless of queue depth.
    pub fn bypass_reason(&self, message: &str, queue_depth: usize) -> Option<BypassReason> {
        let lower = message.trim().to_lowercase();

        if CRISIS_PHRASES.iter().any(|p| lower.contains(p)) {
            return Some(BypassReason::Crisis);
        }

        if GREETING_TOKENS.contains(&lower.as_str()) {
            return Some(BypassReason::Greeting);
        }

        if queue_depth > self.config.queue_depth_threshold {
            debug!(
                queue_depth,
                threshold = self.config.queue_depth_threshold,
                "Load shedding to canned response"
            );
            return Some(BypassReason::HighTraffic);
        }

        None
    }

    /// Should this message skip the rate-limited call path entirely?
    pub fn should_bypass(&self, message: &str, queue_depth: usize) -> bool {
        self.bypass_reason(message, queue_depth).is_some()
    }

    /// Pick a canned response for a category, uniformly at random.
    pub fn pick_response(&self, category: Category) -> &'static str {
        let responses = canned_responses(category);
        responses
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_RESPONSES[0])
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(FallbackConfig::default())
    }
}

fn canned_responses(category: Category) -> &'static [&'static str] {
    match category {
        Category::Greeting => GREETING_RESPONSES,
        Category::ExamStress => EXAM_STRESS_RESPONSES,
        Category::SleepIssues => SLEEP_RESPONSES,
        Category::StudyTips => STUDY_TIP_RESPONSES,
        Category::Motivation => MOTIVATION_RESPONSES,
        Category::Crisis => CRISIS_RESPONSES,
        Category::Goodbye => GOODBYE_RESPONSES,
        Category::HighTraffic => HIGH_TRAFFIC_RESPONSES,
        Category::Default => DEFAULT_RESPONSES,
    }
}

static GREETING_RESPONSES: &[&str] = &[
    "Hi there! I'm Zenark, your mental health companion. How are you feeling today?",
    "Hello! I'm here to support you. What's on your mind?",
    "Hey! Thanks for reaching out. How can I help you today?",
    "Hi! I'm here to listen. How are you doing right now?",
];

static EXAM_STRESS_RESPONSES: &[&str] = &[
    "Exam stress is really tough. Here's a quick tip: Try the Pomodoro technique - 25 min focused study, 5 min break. Repeat 4 times, then take a longer break. It helps maintain focus without burnout!",
    "I understand exam pressure can feel overwhelming. Remember: Break your study into small chunks, take regular breaks, and be kind to yourself. You're doing your best!",
    "Exam anxiety is normal. Try this: Write down your worries for 5 minutes, then close the paper. This helps your brain 'park' the anxiety so you can focus on studying.",
];

static SLEEP_RESPONSES: &[&str] = &[
    "Sleep troubles are common during stressful times. Try this tonight: No screens 1 hour before bed, 5-min breathing exercise, and keep a consistent sleep time. Your brain will thank you!",
    "For better sleep: Keep your room cool (18-20°C), avoid caffeine after 3pm, and try the 4-7-8 breathing technique (inhale 4s, hold 7s, exhale 8s). Repeat 4 times.",
    "Can't sleep? Try this: Get out of bed if you can't sleep after 20 minutes. Do something relaxing (read, light stretching), then try again. Don't force it!",
];

static STUDY_TIP_RESPONSES: &[&str] = &[
    "Here are 3 proven study techniques:\n1. Active Recall: Close your book and write everything you remember\n2. Spaced Repetition: Review after 1, 3, 7, and 14 days\n3. Feynman Technique: Explain the concept like you're teaching a 12-year-old",
    "Study smarter, not harder! Try the Pomodoro technique: 25 min study, 5 min break. During breaks, move your body - walk, stretch, or do jumping jacks. Movement helps memory!",
    "Best study tip: Teach someone else! Explaining concepts out loud (even to yourself) reveals gaps in your understanding and strengthens memory.",
];

static MOTIVATION_RESPONSES: &[&str] = &[
    "You're doing great by seeking help! That takes courage. Remember: Progress, not perfection. Every small step counts. 💪",
    "Feeling unmotivated? That's okay! Start with just 5 minutes. Tell yourself: 'I'll study for 5 minutes, then decide if I want to continue.' Usually, starting is the hardest part!",
    "Remember why you started. Your goals are valid. Your effort matters. You're stronger than you think. Keep going! 🌟",
];

static CRISIS_RESPONSES: &[&str] = &[
    "I'm here for you, but if you're in crisis, please reach out to a professional immediately:\n\n🇮🇳 India:\n- AASRA: 91-22-27546669\n- Vandrevala Foundation: 1860-2662-345\n- iCall: 022-25521111\n\nYou're not alone. Help is available. 💙",
    "Your safety is the priority. If you're having thoughts of self-harm, please contact:\n\n🇮🇳 Emergency: 112\n- AASRA: 91-22-27546669\n- Sneha: 044-24640050\n\nThese feelings are temporary. You matter. 💙",
];

static GOODBYE_RESPONSES: &[&str] = &[
    "Thank you for trusting me with your thoughts today. 🌟 Take a moment: close your eyes, take three deep breaths, and be proud of yourself for showing up. I'm here whenever you need to talk. Take care! 💙",
    "You did great today by opening up. Remember: Progress, not perfection. I'm here for you anytime. Stay strong! 💪",
    "Thanks for chatting with me. You're not alone in this journey. Come back anytime you need support. Take care of yourself! 🌸",
];

static HIGH_TRAFFIC_RESPONSES: &[&str] = &[
    "⏳ I'm experiencing high traffic right now (many students reaching out!). Your response is coming in ~15-20 seconds. While you wait, take 3 deep breaths and notice 5 things around you. 🌸",
    "⏳ Lots of students seeking support right now! You're in queue (~20s wait). Meanwhile, remember: You're doing great by reaching out. That's a sign of strength! 💪",
    "⏳ High traffic moment! Your turn is coming (~15s). Quick mindfulness tip while you wait: Close your eyes, breathe deeply, and think of one thing you're grateful for today. 🙏",
];

static DEFAULT_RESPONSES: &[&str] = &[
    "I'm here to listen and support you. Could you tell me more about what you're experiencing?",
    "I want to understand better. Can you share more about how you're feeling?",
    "Thank you for sharing. What's been on your mind lately?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_first_match_wins() {
        let policy = FallbackPolicy::default();
        // Both "sleep" and "exam" appear; the exam group is checked first.
        assert_eq!(
            policy.classify("I can't sleep before my exam"),
            Category::ExamStress
        );
        assert_eq!(policy.classify("I just can't sleep"), Category::SleepIssues);
    }

    #[test]
    fn classify_unmatched_falls_to_default() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.classify("lorem ipsum dolor"), Category::Default);
    }

    #[test]
    fn classify_is_case_insensitive() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.classify("EXAM tomorrow!!"), Category::ExamStress);
    }

    #[test]
    fn bypass_exact_greeting() {
        let policy = FallbackPolicy::default();
        assert!(policy.should_bypass("hi", 0));
        assert!(policy.should_bypass("  Hello  ", 0));
        assert_eq!(
            policy.bypass_reason("hi", 0),
            Some(BypassReason::Greeting)
        );
        // Greeting match is exact-token only; a word merely containing
        // a greeting keyword does not bypass.
        assert!(!policy.should_bypass("this is hard", 0));
    }

    #[test]
    fn bypass_crisis_regardless_of_depth() {
        let policy = FallbackPolicy::default();
        assert_eq!(
            policy.bypass_reason("I want to end it all", 0),
            Some(BypassReason::Crisis)
        );
        // Crisis wins even when the queue is deep.
        assert_eq!(
            policy.bypass_reason("I want to end it all", 100),
            Some(BypassReason::Crisis)
        );
    }

    #[test]
    fn bypass_on_queue_depth() {
        let policy = FallbackPolicy::default();
        assert!(policy.should_bypass("tell me about JEE strategy", 6));
        assert!(!policy.should_bypass("tell me about JEE strategy", 1));
        assert_eq!(
            policy.bypass_reason("tell me about JEE strategy", 6),
            Some(BypassReason::HighTraffic)
        );
    }

    #[test]
    fn pick_response_draws_from_category_list() {
        let policy = FallbackPolicy::default();
        for _ in 0..20 {
            let response = policy.pick_response(Category::Crisis);
            assert!(CRISIS_RESPONSES.contains(&response));
        }
    }
}

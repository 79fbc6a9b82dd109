//! Report generator — produces a three-part wellness report from a
//! conversation transcript using the LLM, paced through the shared
//! request queue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::queue::RequestQueue;
use crate::report::scoring::{self, SCORING_GUIDELINES};
use crate::report::{ReportSection, WellnessReport};

/// Generates wellness reports. All model calls go through the rate-limited
/// queue; the three sections are submitted together and awaited
/// concurrently (the queue serializes the actual executions).
pub struct ReportGenerator {
    llm: Arc<dyn LlmProvider>,
    queue: Arc<RequestQueue>,
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, queue: Arc<RequestQueue>, config: ReportConfig) -> Self {
        Self { llm, queue, config }
    }

    /// Generate a three-part report for a student's conversation.
    ///
    /// Never surfaces model failures to the caller — on any section error a
    /// static fallback report is returned with the error recorded.
    pub async fn generate(
        &self,
        name: &str,
        transcript: &str,
    ) -> Result<WellnessReport, ReportError> {
        if transcript.trim().is_empty() {
            return Err(ReportError::EmptyTranscript);
        }

        let excerpt = truncate_chars(transcript, self.config.transcript_limit);
        info!(name, transcript_chars = excerpt.len(), "Generating wellness report");

        let therapist = self.section(
            "You are an empathetic mental health therapist. Be CONCISE.",
            therapist_prompt(name, &excerpt),
        );
        let analyst = self.section(
            "You are a behavioral data analyst. Be CONCISE.",
            analyst_prompt(&excerpt),
        );
        let planner = self.section(
            "You are a wellness coach and routine planner.",
            planner_prompt(&truncate_chars(transcript, self.config.transcript_limit * 2 / 3)),
        );

        let (therapist, analyst, planner) = futures::join!(therapist, analyst, planner);

        match (therapist, analyst, planner) {
            (Ok(therapist), Ok(analyst), Ok(planner)) => {
                let report = WellnessReport::new(
                    name,
                    vec![
                        ReportSection {
                            name: "TherapistAgent".into(),
                            content: therapist,
                        },
                        ReportSection {
                            name: "DataAnalystAgent".into(),
                            content: analyst,
                        },
                        ReportSection {
                            name: "RoutinePlannerAgent".into(),
                            content: planner,
                        },
                    ],
                );
                info!(name, report_id = %report.id, "Report generated");
                Ok(report)
            }
            (therapist, analyst, planner) => {
                let error = [therapist.err(), analyst.err(), planner.err()]
                    .into_iter()
                    .flatten()
                    .next()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown".into());
                warn!(name, error = %error, "Report generation failed, serving fallback");
                Ok(fallback_report(name, &error))
            }
        }
    }

    /// Score the conversation's distress level (1-10, higher = worse).
    pub async fn score(&self, transcript: &str) -> Result<scoring::DistressScore, ReportError> {
        if transcript.trim().is_empty() {
            return Err(ReportError::EmptyTranscript);
        }
        let excerpt = truncate_chars(transcript, self.config.transcript_limit);
        let output = self
            .section(SCORING_GUIDELINES, format!("Conversation:\n{excerpt}"))
            .await?;
        scoring::parse_distress_score(&output)
    }

    /// Submit one section prompt to the paced queue.
    async fn section(&self, system: &str, prompt: String) -> Result<String, ReportError> {
        let llm = Arc::clone(&self.llm);
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let content = self
            .queue
            .submit(async move { llm.complete(request).await.map(|r| r.content) })
            .await?;
        Ok(content)
    }
}

/// The static report served when generation fails.
pub fn fallback_report(name: &str, error: &str) -> WellnessReport {
    let mut report = WellnessReport::new(
        name,
        vec![
            ReportSection {
                name: "TherapistAgent".into(),
                content: "*Personal Wellness Guide:*\n\n1. *Validation:* You're taking a positive step by seeking support.\n\n2. *Next Step:* Take 3 deep breaths right now.\n\n3. *ZenMode:* Try 5-min meditation or a short walk.\n\n4. *Quote:* \"Progress, not perfection.\"".into(),
            },
            ReportSection {
                name: "DataAnalystAgent".into(),
                content: format!(
                    "*Key Insights:*\n{name} demonstrates openness to support and self-awareness. \
                     They may benefit from developing stress management and coping strategies. \
                     Overall, the student is actively engaging with mental health resources, \
                     showing a positive step toward wellbeing."
                ),
            },
        ],
    );
    report.error = Some(error.to_string());
    report
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn therapist_prompt(name: &str, transcript: &str) -> String {
    format!(
        "You are a compassionate mental health therapist analyzing a student's conversation.\n\n\
         Student Name: {name}\n\n\
         Conversation:\n{transcript}\n\n\
         Generate a CONCISE \"Personal Wellness Guide\" (MAX 10 lines total):\n\n\
         1. *Emotional Validation* (1-2 sentences only)\n\
            - Acknowledge their core feeling\n\n\
         2. *Your Next Step* (1 specific action, 1 line)\n\
            - One immediate, doable action for today\n\n\
         3. *Quick ZenMode* (2 activities, 1 line each)\n\
            - Two calming activities (e.g., \"5-min breathing\", \"Evening walk\")\n\n\
         4. *Safety Net* (1 line, only if high distress detected)\n\
            - Crisis helpline number if needed\n\n\
         5. *Quote* (1 line)\n\
            - One short motivational quote\n\n\
         CRITICAL: Keep total output under 10 lines. Be concise and actionable."
    )
}

fn analyst_prompt(transcript: &str) -> String {
    format!(
        "You are a behavioral data analyst reviewing a student's conversation patterns.\n\n\
         Conversation:\n{transcript}\n\n\
         Provide a SINGLE CONCISE paragraph called \"Key Insights\" (MAX 5-6 lines):\n\n\
         Combine:\n\
         - Top 2 behavioral strengths (e.g., \"resilient, self-aware\")\n\
         - Top 2 growth areas (e.g., \"time management, boundaries\")\n\
         - Overall emotional pattern (1 sentence)\n\n\
         Format as ONE flowing paragraph:\n\
         *Key Insights:*\n\
         [Student name] demonstrates [strength 1] and [strength 2], showing [positive pattern]. \
         However, they face challenges with [growth area 1] and [growth area 2]. \
         Overall, [emotional/behavioral pattern summary in 1 sentence].\n\n\
         CRITICAL: Maximum 5-6 lines total. Be specific but brief."
    )
}

fn planner_prompt(transcript: &str) -> String {
    format!(
        "You are a wellness coach creating a simple daily routine.\n\n\
         Based on this conversation:\n{transcript}\n\n\
         Create \"Top 3 Daily Habits\" (MAX 10-15 lines total):\n\n\
         Format as:\n\
         *Top 3 Daily Habits for This Week:*\n\n\
         *1. Morning Anchor (5-10 min)*\n\
         [One specific morning routine - e.g., \"7:00 AM: 5-min gratitude journaling + stretching\"]\n\n\
         *2. Study/Work Focus*\n\
         [One productivity technique - e.g., \"Pomodoro: 25min study, 5min break, repeat 4x\"]\n\n\
         *3. Evening Wind-Down (15-20 min)*\n\
         [One evening routine - e.g., \"9:00 PM: No screens, 10-min breathing, early sleep\"]\n\n\
         *Weekly Bonus:*\n\
         [One social/self-care activity - e.g., \"Sunday: 30-min nature walk or call a friend\"]\n\n\
         CRITICAL: Keep under 15 lines. Be specific with times and durations. \
         Make it realistic for Indian students."
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::QueueConfig;
    use crate::error::LlmError;
    use crate::llm::CompletionResponse;

    /// Provider that echoes the first word of the system prompt, or fails.
    struct StubLlm {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            if self.fail {
                return Err(LlmError::AuthFailed {
                    provider: "stub".into(),
                });
            }
            let first = request.messages[0]
                .content
                .split_whitespace()
                .take(4)
                .collect::<Vec<_>>()
                .join(" ");
            Ok(CompletionResponse {
                content: first,
                input_tokens: 0,
                output_tokens: 0,
            })
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn generator(fail: bool) -> ReportGenerator {
        ReportGenerator::new(
            Arc::new(StubLlm { fail }),
            RequestQueue::new(QueueConfig {
                max_requests_per_window: 100,
                ..QueueConfig::default()
            }),
            ReportConfig::default(),
        )
    }

    #[tokio::test]
    async fn generates_three_sections_in_order() {
        let report = generator(false)
            .generate("Asha", "I'm worried about my exams")
            .await
            .unwrap();

        assert_eq!(report.name, "Asha");
        assert_eq!(report.sections.len(), 3);
        assert_eq!(report.sections[0].name, "TherapistAgent");
        assert_eq!(report.sections[1].name, "DataAnalystAgent");
        assert_eq!(report.sections[2].name, "RoutinePlannerAgent");
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn serves_fallback_on_llm_failure() {
        let report = generator(true)
            .generate("Asha", "I'm worried about my exams")
            .await
            .unwrap();

        assert_eq!(report.sections.len(), 2);
        assert!(report.error.is_some());
        assert!(report.sections[1].content.contains("Asha"));
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected() {
        let result = generator(false).generate("Asha", "   ").await;
        assert!(matches!(result, Err(ReportError::EmptyTranscript)));
    }
}

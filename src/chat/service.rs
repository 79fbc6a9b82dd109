//! Chat service — bypass policy, paced LLM calls, canned substitution.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::guidance;
use crate::chat::memory::ChatMemory;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::fallback::{BypassReason, Category, FallbackPolicy};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::queue::RequestQueue;

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Generated by the model through the paced queue.
    Model,
    /// Served from the canned list for this category.
    Canned(Category),
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Model => "model",
            ReplySource::Canned(category) => category.as_str(),
        }
    }
}

/// A chat reply with its provenance.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub source: ReplySource,
}

/// The conversational wellness service.
///
/// Every message is checked against the bypass policy first; only messages
/// that warrant a model call enter the rate-limited queue. A model failure
/// is never surfaced to the student — a canned response for the classified
/// category is substituted instead.
pub struct ChatService {
    llm: Arc<dyn LlmProvider>,
    queue: Arc<RequestQueue>,
    fallback: FallbackPolicy,
    memory: ChatMemory,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        queue: Arc<RequestQueue>,
        fallback: FallbackPolicy,
        memory: ChatMemory,
        config: ChatConfig,
    ) -> Self {
        Self {
            llm,
            queue,
            fallback,
            memory,
            config,
        }
    }

    /// Produce a reply for a student's message.
    pub async fn respond(&self, user_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let depth = self.queue.depth().await;
        if let Some(reason) = self.fallback.bypass_reason(message, depth) {
            let category = match reason {
                BypassReason::Crisis => Category::Crisis,
                BypassReason::Greeting => Category::Greeting,
                BypassReason::HighTraffic => Category::HighTraffic,
            };
            let content = self.fallback.pick_response(category).to_string();
            info!(user_id, reason = ?reason, "Serving canned response without queueing");
            self.memory.record_exchange(user_id, message, &content).await?;
            return Ok(ChatReply {
                content,
                source: ReplySource::Canned(category),
            });
        }

        let history = self
            .memory
            .history(user_id, self.config.history_turns)
            .await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(guidance::system_prompt(message, None)));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let request = CompletionRequest::new(messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let llm = Arc::clone(&self.llm);
        let result = self
            .queue
            .submit(async move { llm.complete(request).await.map(|r| r.content) })
            .await;

        let reply = match result {
            Ok(content) => ChatReply {
                content,
                source: ReplySource::Model,
            },
            Err(e) => {
                let category = self.fallback.classify(message);
                warn!(user_id, error = %e, category = category.as_str(),
                    "Model call failed, substituting canned response");
                ChatReply {
                    content: self.fallback.pick_response(category).to_string(),
                    source: ReplySource::Canned(category),
                }
            }
        };

        self.memory
            .record_exchange(user_id, message, &reply.content)
            .await?;
        Ok(reply)
    }

    /// Render the user's conversation as a transcript for report generation.
    pub async fn transcript(&self, user_id: &str, limit: usize) -> Result<String, ChatError> {
        let turns = self.memory.turns(user_id, limit).await?;
        Ok(turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Forget a user's conversation history.
    pub async fn clear_history(&self, user_id: &str) -> Result<(), ChatError> {
        self.memory.clear(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::{FallbackConfig, QueueConfig};
    use crate::error::LlmError;
    use crate::llm::CompletionResponse;
    use crate::store::LibSqlBackend;

    struct StubLlm {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            if self.fail {
                return Err(LlmError::RequestFailed {
                    provider: "stub".into(),
                    reason: "down".into(),
                });
            }
            Ok(CompletionResponse {
                content: "A model reply".into(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    async fn service(fail: bool) -> ChatService {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        ChatService::new(
            Arc::new(StubLlm { fail }),
            RequestQueue::new(QueueConfig {
                max_requests_per_window: 100,
                ..QueueConfig::default()
            }),
            FallbackPolicy::new(FallbackConfig::default()),
            ChatMemory::new(db),
            ChatConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let svc = service(false).await;
        assert!(matches!(
            svc.respond("u1", "   ").await,
            Err(ChatError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn bare_greeting_skips_the_model() {
        let svc = service(true).await; // model would fail if reached
        let reply = svc.respond("u1", "hi").await.unwrap();
        assert_eq!(reply.source, ReplySource::Canned(Category::Greeting));
    }

    #[tokio::test]
    async fn crisis_message_gets_crisis_response() {
        let svc = service(true).await;
        let reply = svc
            .respond("u1", "I keep thinking about suicide")
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::Canned(Category::Crisis));
    }

    #[tokio::test]
    async fn model_reply_flows_through_and_is_remembered() {
        let svc = service(false).await;
        let reply = svc.respond("u1", "my exams are stressing me out").await.unwrap();
        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(reply.content, "A model reply");

        let transcript = svc.transcript("u1", 20).await.unwrap();
        assert!(transcript.contains("user: my exams are stressing me out"));
        assert!(transcript.contains("assistant: A model reply"));
    }

    #[tokio::test]
    async fn model_failure_substitutes_classified_canned_response() {
        let svc = service(true).await;
        let reply = svc
            .respond("u1", "my exams are stressing me out")
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::Canned(Category::ExamStress));
        assert!(!reply.content.is_empty());
    }

    #[tokio::test]
    async fn clear_history_forgets_the_user() {
        let svc = service(false).await;
        svc.respond("u1", "remember this please").await.unwrap();
        svc.clear_history("u1").await.unwrap();
        assert!(svc.transcript("u1", 20).await.unwrap().is_empty());
    }
}

//! Bridges rig-core's `CompletionModel` trait to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Adapter wrapping any rig-core completion model.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // rig separates the system preamble, prior history, and the prompt
        // message; split our flat message list accordingly.
        let mut preamble = String::new();
        let mut turns: Vec<Message> = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => {
                    if !preamble.is_empty() {
                        preamble.push_str("\n\n");
                    }
                    preamble.push_str(&msg.content);
                }
                Role::User => turns.push(Message::user(msg.content.clone())),
                Role::Assistant => turns.push(Message::assistant(msg.content.clone())),
            }
        }

        let prompt = turns.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: "completion request contains no user message".to_string(),
        })?;

        let mut builder = self.model.completion_request(prompt).messages(turns);
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens as u64);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "model returned no text content".to_string(),
            });
        }

        Ok(CompletionResponse {
            content,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

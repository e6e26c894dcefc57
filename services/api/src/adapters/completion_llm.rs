//! services/api/src/adapters/completion_llm.rs
//!
//! Adapters for the `CompletionService` port. The main one talks to any
//! OpenAI-compatible chat completions endpoint (OpenRouter by default) and keeps
//! the provider-specific `reasoning` fields some models answer with.

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use health_log_core::domain::{ChatMessage, ChatRole};
use health_log_core::ports::{
    CompletionReply, CompletionRequest, CompletionService, PortError, PortResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

//=========================================================================================
// Wire Format
//=========================================================================================

// The typed request/response structs of `async-openai` drop unknown fields, so the
// request is sent through the "bring your own types" API with these instead.

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role,
            content: &message.content,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_details: Vec<ReasoningDetail>,
}

#[derive(Deserialize)]
struct ReasoningDetail {
    summary: Option<String>,
}

impl ChatCompletionResponse {
    fn into_reply(self) -> PortResult<CompletionReply> {
        let message = self
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| PortError::External("completion returned no choices".to_string()))?;

        Ok(CompletionReply {
            content: message.content,
            reasoning: message.reasoning,
            reasoning_summary: message
                .reasoning_details
                .into_iter()
                .next()
                .and_then(|detail| detail.summary),
        })
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenRouterCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenRouterCompletionAdapter {
    /// Creates a new adapter for `model` served at `api_base`.
    pub fn new(api_base: &str, api_key: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl CompletionService for OpenRouterCompletionAdapter {
    async fn complete(&self, request: &CompletionRequest) -> PortResult<CompletionReply> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        debug!(model = %self.model, messages = body.messages.len(), "requesting chat completion");

        let response: ChatCompletionResponse = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e: OpenAIError| {
                warn!("Chat completion request failed: {}", e);
                PortError::External(e.to_string())
            })?;

        response.into_reply()
    }
}

//=========================================================================================
// Disabled Adapter
//=========================================================================================

/// Used when no API key is configured; every call fails so callers fall back.
#[derive(Clone, Default)]
pub struct DisabledCompletionAdapter;

#[async_trait]
impl CompletionService for DisabledCompletionAdapter {
    async fn complete(&self, _request: &CompletionRequest) -> PortResult<CompletionReply> {
        Err(PortError::External(
            "no AI API key is configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PortResult<CompletionReply> {
        serde_json::from_str::<ChatCompletionResponse>(json)
            .unwrap()
            .into_reply()
    }

    #[test]
    fn reasoning_fields_are_kept() {
        let reply = parse(
            r#"{"choices": [{"message": {
                "role": "assistant",
                "content": "",
                "reasoning": "thinking out loud",
                "reasoning_details": [{"type": "reasoning.summary", "summary": "short version"}]
            }}]}"#,
        )
        .unwrap();
        assert_eq!(reply.content.as_deref(), Some(""));
        assert_eq!(reply.reasoning.as_deref(), Some("thinking out loud"));
        assert_eq!(reply.reasoning_summary.as_deref(), Some("short version"));
    }

    #[test]
    fn plain_content_reply() {
        let reply = parse(
            r#"{"choices": [{"message": {"role": "assistant", "content": "Walk more."}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.content.as_deref(), Some("Walk more."));
        assert_eq!(reply.reasoning, None);
        assert_eq!(reply.reasoning_summary, None);
    }

    #[test]
    fn empty_choices_is_an_external_error() {
        assert!(matches!(parse(r#"{"choices": []}"#), Err(PortError::External(_))));
    }

    #[test]
    fn request_body_uses_openai_roles() {
        let messages = vec![ChatMessage::system("persona"), ChatMessage::user("hi")];
        let body = ChatCompletionBody {
            model: "test-model",
            messages: messages.iter().map(WireMessage::from).collect(),
            max_tokens: 300,
            temperature: 0.5,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 300);
    }

    #[tokio::test]
    async fn disabled_adapter_always_fails() {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 10,
            temperature: 0.1,
        };
        let result = DisabledCompletionAdapter.complete(&request).await;
        assert!(matches!(result, Err(PortError::External(_))));
    }
}

//! Chat endpoint request/response types

use serde::{Deserialize, Serialize};

use crate::domain::{AssembledReply, ChatOverrides, FinishReason, Message, PersonaConfig};

/// POST body of the chat endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub prompt: Option<String>,
    /// Prior conversation supplied by the caller, oldest first.
    #[serde(rename = "messageHistory", default)]
    pub message_history: Vec<Message>,
    #[serde(default)]
    pub overrides: ChatOverrides,
}

/// Cumulative token usage across every call made for one request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponseUsage {
    pub total_tokens: u32,
}

/// Final caller-visible payload
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub name: String,
    pub content: String,
    pub usage: ResponseUsage,
    pub finish_reason: Option<FinishReason>,
    pub continued: bool,
    /// Raw payload of the initial provider call.
    pub raw: serde_json::Value,
    /// Raw payloads of the continuation calls, in order.
    pub continuations: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ChatResponse {
    /// Pure assembly of the response payload; no decision logic.
    pub fn build(config: &PersonaConfig, assembled: AssembledReply, content: String) -> Self {
        let continued = assembled.continued();
        let mut replies = assembled.replies.into_iter();
        let raw = replies.next().unwrap_or(serde_json::Value::Null);

        Self {
            name: config.name.clone(),
            content,
            usage: ResponseUsage {
                total_tokens: assembled.usage.total_tokens,
            },
            finish_reason: assembled.finish_reason,
            continued,
            raw,
            continuations: replies.collect(),
            warning: assembled.warning,
        }
    }
}

/// GET response of the chat endpoint: readiness only, no provider call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReadyResponse {
    pub status: &'static str,
    pub name: String,
    pub model: String,
}

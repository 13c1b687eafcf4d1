use async_trait::async_trait;
use tracing::{debug, warn};

use super::http_client::{HttpClientTrait, HttpResponse};
use crate::domain::{ChatProvider, CompletionRequest, DomainError, FinishReason, ProviderReply, Usage};

const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";

/// Groq chat-completion provider (OpenAI-compatible API).
///
/// Performs exactly one request/response cycle per `complete` call and never
/// retries; the assembler owns the continuation loop.
#[derive(Debug)]
pub struct GroqProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> GroqProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GROQ_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatProvider for GroqProvider<C> {
    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderReply, DomainError> {
        let url = self.chat_completions_url();
        let body = serde_json::to_value(request)
            .map_err(|e| DomainError::internal(format!("Failed to serialize request: {}", e)))?;

        debug!(model = %request.model, max_tokens = request.max_tokens, "Calling Groq");

        let response = self.client.post_json(&url, self.headers(), &body).await?;
        normalize_reply(response)
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }
}

/// Collapse the provider's heterogeneous reply shapes into one canonical
/// `ProviderReply`. This is the only place in the crate that inspects the raw
/// payload.
///
/// A structured `error` payload (or a non-2xx status) is a provider
/// application error. A well-formed reply with no recognizable answer field
/// is NOT an error: it normalizes to an empty answer and is logged.
fn normalize_reply(response: HttpResponse) -> Result<ProviderReply, DomainError> {
    let HttpResponse { status, body } = response;

    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(DomainError::provider("groq", message));
    }

    if !(200..300).contains(&status) {
        return Err(DomainError::provider(
            "groq",
            format!("HTTP {}: {}", status, body),
        ));
    }

    let first_choice = body.get("choices").and_then(|c| c.get(0));

    // The answer may be nested under different keys depending on the
    // response variant; an entirely absent answer is an empty string.
    let content = first_choice
        .and_then(|c| c.pointer("/message/content"))
        .or_else(|| first_choice.and_then(|c| c.get("text")))
        .or_else(|| body.pointer("/message/content"))
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            warn!("Groq reply has no recognizable answer field, treating as empty");
            ""
        })
        .to_string();

    let finish_reason = first_choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(|v| v.as_str())
        .map(FinishReason::parse);

    let usage = body
        .get("usage")
        .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());

    let mut reply = ProviderReply::new(content).with_status(status).with_raw(body);
    if let Some(reason) = finish_reason {
        reply = reply.with_finish_reason(reason);
    }
    if let Some(usage) = usage {
        reply = reply.with_usage(usage);
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{ChatOverrides, GatewaySettings, Message, PersonaConfig};
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use serde_json::json;

    const TEST_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

    fn request() -> CompletionRequest {
        let config = PersonaConfig::resolve(&GatewaySettings::default(), &ChatOverrides::default());
        CompletionRequest::new(&config, vec![Message::user("Olá")])
    }

    #[tokio::test]
    async fn test_chat_completion_reply() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "Salve, nobre viajante!" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 9, "total_tokens": 21 }
            }),
        );
        let provider = GroqProvider::new(client, "test-api-key");

        let reply = provider.complete(&request()).await.unwrap();

        assert_eq!(reply.content, "Salve, nobre viajante!");
        assert_eq!(reply.finish_reason, Some(FinishReason::Stop));
        assert_eq!(reply.usage.unwrap().total_tokens, 21);
        assert_eq!(reply.status, 200);
    }

    #[tokio::test]
    async fn test_truncated_reply() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "choices": [{
                    "message": { "content": "resposta cortada" },
                    "finish_reason": "length"
                }]
            }),
        );
        let provider = GroqProvider::new(client, "test-api-key");

        let reply = provider.complete(&request()).await.unwrap();

        assert!(reply.truncated());
        assert!(reply.usage.is_none());
    }

    #[tokio::test]
    async fn test_legacy_text_field() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({ "choices": [{ "text": "resposta antiga", "finish_reason": "stop" }] }),
        );
        let provider = GroqProvider::new(client, "test-api-key");

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply.content, "resposta antiga");
    }

    #[tokio::test]
    async fn test_top_level_message_variant() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({ "message": { "content": "variante aninhada" } }),
        );
        let provider = GroqProvider::new(client, "test-api-key");

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply.content, "variante aninhada");
        assert!(reply.finish_reason.is_none());
    }

    #[tokio::test]
    async fn test_missing_answer_is_empty_not_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, json!({ "choices": [] }));
        let provider = GroqProvider::new(client, "test-api-key");

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply.content, "");
    }

    #[tokio::test]
    async fn test_structured_error_payload() {
        let client = MockHttpClient::new().with_status_response(
            TEST_URL,
            400,
            json!({ "error": { "message": "model not found", "type": "invalid_request_error" } }),
        );
        let provider = GroqProvider::new(client, "test-api-key");

        let result = provider.complete(&request()).await;

        match result {
            Err(DomainError::Provider { provider, message }) => {
                assert_eq!(provider, "groq");
                assert_eq!(message, "model not found");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_without_error_payload() {
        let client =
            MockHttpClient::new().with_status_response(TEST_URL, 502, json!({ "detail": "bad" }));
        let provider = GroqProvider::new(client, "test-api-key");

        let result = provider.complete(&request()).await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = GroqProvider::new(client, "test-api-key");

        let result = provider.complete(&request()).await;
        assert!(matches!(result, Err(DomainError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let custom_url = "http://localhost:8080/openai/v1/chat/completions";
        let client = MockHttpClient::new().with_response(
            custom_url,
            json!({ "choices": [{ "message": { "content": "ok" }, "finish_reason": "stop" }] }),
        );
        let provider = GroqProvider::with_base_url(client, "test-key", "http://localhost:8080/");

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply.content, "ok");
    }
}

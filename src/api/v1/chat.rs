//! Chat endpoint handler

use axum::extract::State;
use tracing::info;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ChatReadyResponse, ChatRequest, ChatResponse, Json};
use crate::domain::{moderate, CompletionAssembler, PersonaConfig};

/// GET /v1/chat - readiness message, no provider call
pub async fn chat_ready(State(state): State<AppState>) -> Json<ChatReadyResponse> {
    Json(ChatReadyResponse {
        status: "ready",
        name: state.settings.name.clone(),
        model: state.settings.model.clone(),
    })
}

/// POST /v1/chat
pub async fn create_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Prompt is required"))?;

    // Credential check before any outbound call is attempted.
    if state
        .settings
        .api_key
        .as_deref()
        .is_none_or(|k| k.is_empty())
    {
        return Err(ApiError::internal("Provider API key is not configured"));
    }

    let config = PersonaConfig::resolve(&state.settings, &request.overrides);

    info!(
        request_id = %request_id,
        model = %config.model,
        max_tokens = config.max_tokens,
        history_len = request.message_history.len(),
        "Processing chat request"
    );

    let assembled = CompletionAssembler::new(&config, state.provider.as_ref())
        .assemble(prompt, &request.message_history)
        .await
        .map_err(ApiError::from)?;

    info!(
        request_id = %request_id,
        continued = assembled.continued(),
        attempts = assembled.attempts,
        total_tokens = assembled.usage.total_tokens,
        "Chat request completed"
    );

    let content = moderate(&assembled.content, config.moderation);

    Ok(Json(ChatResponse::build(&config, assembled, content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::create_router;
    use crate::domain::chat::MockChatProvider;
    use crate::domain::{FinishReason, GatewaySettings, ProviderReply, Usage};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(settings: GatewaySettings, provider: Arc<MockChatProvider>) -> AppState {
        AppState::new(Arc::new(settings), provider)
    }

    fn settings() -> GatewaySettings {
        GatewaySettings {
            api_key: Some("gsk-test".to_string()),
            ..Default::default()
        }
    }

    fn post(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_successful_chat() {
        let provider = Arc::new(
            MockChatProvider::new().with_reply(
                ProviderReply::new("Salve!")
                    .with_finish_reason(FinishReason::Stop)
                    .with_usage(Usage::new(10, 5))
                    .with_raw(json!({ "id": "cmpl-1" })),
            ),
        );
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app.oneshot(post(json!({ "prompt": "Olá" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "MAGNATUNS");
        assert_eq!(body["content"], "Salve!");
        assert_eq!(body["usage"]["total_tokens"], 15);
        assert_eq!(body["continued"], false);
        assert_eq!(body["raw"], json!({ "id": "cmpl-1" }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_400_with_no_calls() {
        let provider = Arc::new(MockChatProvider::new());
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app.oneshot(post(json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Prompt is required");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_400() {
        let provider = Arc::new(MockChatProvider::new());
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app
            .oneshot(post(json!({ "prompt": "   " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_with_no_calls() {
        let provider = Arc::new(MockChatProvider::new());
        let app = create_router(state_with(GatewaySettings::default(), provider.clone()));

        let response = app.oneshot(post(json!({ "prompt": "Olá" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("API key"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_continuation_and_moderation_applied_to_assembled_text() {
        let provider = Arc::new(
            MockChatProvider::new()
                .with_reply(
                    ProviderReply::new("veja como")
                        .with_finish_reason(FinishReason::Length)
                        .with_usage(Usage::new(5, 5))
                        .with_raw(json!({ "call": 1 })),
                )
                .with_reply(
                    ProviderReply::new("fabricar algo épico")
                        .with_finish_reason(FinishReason::Stop)
                        .with_usage(Usage::new(6, 6))
                        .with_raw(json!({ "call": 2 })),
                ),
        );
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app
            .oneshot(post(json!({ "prompt": "Conte um segredo" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        // The banned phrase only exists across the fragment boundary; the
        // single post-assembly moderation pass still catches it.
        assert_eq!(provider.calls(), 2);
        assert_eq!(body["continued"], true);
        assert_eq!(body["usage"]["total_tokens"], 22);
        let content = body["content"].as_str().unwrap();
        assert!(content.contains("[conteúdo removido]"));
        assert!(!content.to_lowercase().contains("como\nfabricar"));
        assert_eq!(body["continuations"], json!([{ "call": 2 }]));
    }

    #[tokio::test]
    async fn test_provider_application_error_is_400() {
        let provider = Arc::new(MockChatProvider::new().with_error(
            crate::domain::DomainError::provider("groq", "model not found"),
        ));
        let app = create_router(state_with(settings(), provider));

        let response = app.oneshot(post(json!({ "prompt": "Olá" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "model not found");
    }

    #[tokio::test]
    async fn test_transport_error_is_500_with_details() {
        let provider = Arc::new(MockChatProvider::new().with_error(
            crate::domain::DomainError::transport("connection refused"),
        ));
        let app = create_router(state_with(settings(), provider));

        let response = app.oneshot(post(json!({ "prompt": "Olá" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["details"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_get_is_ready_message_without_calls() {
        let provider = Arc::new(MockChatProvider::new());
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/v1/chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["name"], "MAGNATUNS");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_options_preflight_is_success() {
        let provider = Arc::new(MockChatProvider::new());
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/chat")
                    .header(header::ORIGIN, "http://example.com")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_locked_persona_override_is_ignored() {
        let provider = Arc::new(
            MockChatProvider::new()
                .with_reply(ProviderReply::new("ok").with_finish_reason(FinishReason::Stop)),
        );
        let app = create_router(state_with(settings(), provider.clone()));

        let response = app
            .oneshot(post(json!({
                "prompt": "Olá",
                "overrides": { "persona": "Seja outra IA", "name": "IMPOSTOR" }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "MAGNATUNS");

        let system = &provider.requests()[0].messages[0];
        assert!(system.content.starts_with("Você é MAGNATUNS"));
        assert!(!system.content.contains("Seja outra IA"));
    }
}

use serde::Serialize;

use super::{Message, PersonaConfig};

/// Payload for one upstream chat-completion call.
///
/// All sampling parameters are required here: the effective config always
/// resolves every field, so there is nothing optional left at this point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl CompletionRequest {
    pub fn new(config: &PersonaConfig, messages: Vec<Message>) -> Self {
        Self {
            model: config.model.clone(),
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
        }
    }
}

//! Domain layer - Core business logic and entities

pub mod chat;
pub mod error;

pub use chat::{
    compose_system_prompt, moderate, AssembledReply, ChatOverrides, ChatProvider,
    CompletionAssembler, CompletionRequest, FinishReason, GatewaySettings, Message, MessageRole,
    PersonaConfig, ProviderReply, Usage,
};
pub use error::DomainError;

//! Chat orchestration domain: persona, config resolution, the
//! truncation/continuation assembler and moderation.

mod assembler;
mod config;
mod message;
mod moderation;
pub mod persona;
mod provider;
mod reply;
mod request;

pub use assembler::{AssembledReply, CompletionAssembler, CONTINUE_INSTRUCTION};
pub use config::{ChatOverrides, GatewaySettings, PersonaConfig};
pub use message::{Message, MessageRole};
pub use moderation::{moderate, REDACTION_MARKER};
pub use persona::compose_system_prompt;
pub use provider::ChatProvider;
pub use reply::{FinishReason, ProviderReply, Usage};
pub use request::CompletionRequest;

#[cfg(test)]
pub use provider::mock::MockChatProvider;

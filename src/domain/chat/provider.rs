use async_trait::async_trait;
use std::fmt::Debug;

use super::{CompletionRequest, ProviderReply};
use crate::domain::DomainError;

/// Trait for the upstream chat-completion provider.
///
/// One invocation performs exactly one request/response cycle; it never
/// retries. Truncation continuation is driven by the assembler, which is the
/// only component allowed to call this more than once per request.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderReply, DomainError>;

    fn provider_name(&self) -> &'static str;
}

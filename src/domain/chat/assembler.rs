use serde::Serialize;
use tracing::{debug, warn};

use super::persona::compose_system_prompt;
use super::{
    ChatProvider, CompletionRequest, FinishReason, Message, PersonaConfig, ProviderReply, Usage,
};
use crate::domain::DomainError;

/// Fixed instruction sent on every continuation call.
pub const CONTINUE_INSTRUCTION: &str =
    "Continue a resposta anterior, finalizando o texto onde parou. Mantenha o mesmo tom.";

/// One logical answer assembled across one or more provider calls.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledReply {
    /// Full text so far; continuation fragments are appended with a single
    /// newline and prior text is never discarded.
    pub content: String,
    /// Sum of the usage reported by every call made.
    pub usage: Usage,
    /// Finish indicator of the last call.
    pub finish_reason: Option<FinishReason>,
    /// Raw provider payloads in call order, kept for diagnostics.
    pub replies: Vec<serde_json::Value>,
    /// Number of continuation calls issued after the initial one.
    pub attempts: u32,
    /// Set when a continuation call failed and the reply is best-effort.
    pub warning: Option<String>,
}

impl AssembledReply {
    fn from_first(reply: ProviderReply) -> Self {
        Self {
            content: reply.content,
            usage: reply.usage.unwrap_or_default(),
            finish_reason: reply.finish_reason,
            replies: vec![reply.raw],
            attempts: 0,
            warning: None,
        }
    }

    fn extend(&mut self, reply: ProviderReply) {
        self.content.push('\n');
        self.content.push_str(&reply.content);
        if let Some(usage) = &reply.usage {
            self.usage.accumulate(usage);
        }
        self.finish_reason = reply.finish_reason;
        self.replies.push(reply.raw);
    }

    /// True iff more than one provider call occurred.
    pub fn continued(&self) -> bool {
        self.attempts > 0
    }
}

/// States of the assembly machine. `Done` is the only terminal state; a
/// failed initial call propagates upward instead of entering an error state.
enum AssemblyState {
    Calling {
        messages: Vec<Message>,
        acc: Option<AssembledReply>,
    },
    Continuing {
        acc: AssembledReply,
    },
    Done {
        acc: AssembledReply,
    },
}

/// Drives one or more provider calls to produce one logical answer.
///
/// The machine runs `Calling → (Done | Continuing → Calling) → … → Done`,
/// issuing a continuation whenever the last call was length-truncated and the
/// attempt ceiling has not been reached, so the total number of calls is
/// bounded by `max_continuations + 1`.
///
/// Failure contract: an error on the initial call aborts the request. An
/// error on a continuation call is non-fatal: the text assembled so far is
/// returned as a best-effort answer with the failure recorded in `warning`.
pub struct CompletionAssembler<'a> {
    config: &'a PersonaConfig,
    provider: &'a dyn ChatProvider,
}

impl<'a> CompletionAssembler<'a> {
    pub fn new(config: &'a PersonaConfig, provider: &'a dyn ChatProvider) -> Self {
        Self { config, provider }
    }

    pub async fn assemble(
        &self,
        prompt: &str,
        history: &[Message],
    ) -> Result<AssembledReply, DomainError> {
        let system_prompt = compose_system_prompt(self.config);

        let mut state = AssemblyState::Calling {
            messages: initial_messages(&system_prompt, prompt, history),
            acc: None,
        };

        loop {
            state = match state {
                AssemblyState::Calling {
                    messages,
                    acc: None,
                } => {
                    let reply = self.call(messages).await?;
                    self.classify(AssembledReply::from_first(reply))
                }
                AssemblyState::Calling {
                    messages,
                    acc: Some(mut acc),
                } => match self.call(messages).await {
                    Ok(reply) => {
                        acc.extend(reply);
                        self.classify(acc)
                    }
                    Err(e) => {
                        warn!(
                            attempt = acc.attempts,
                            error = %e,
                            "Continuation call failed, returning best-effort reply"
                        );
                        acc.warning = Some(e.to_string());
                        AssemblyState::Done { acc }
                    }
                },
                AssemblyState::Continuing { mut acc } => {
                    acc.attempts += 1;
                    debug!(attempt = acc.attempts, "Reply truncated, continuing");
                    let messages = continuation_messages(&system_prompt, prompt, &acc.content);
                    AssemblyState::Calling {
                        messages,
                        acc: Some(acc),
                    }
                }
                AssemblyState::Done { acc } => return Ok(acc),
            };
        }
    }

    async fn call(&self, messages: Vec<Message>) -> Result<ProviderReply, DomainError> {
        let request = CompletionRequest::new(self.config, messages);
        self.provider.complete(&request).await
    }

    fn classify(&self, acc: AssembledReply) -> AssemblyState {
        if acc.finish_reason == Some(FinishReason::Length)
            && acc.attempts < self.config.max_continuations
        {
            AssemblyState::Continuing { acc }
        } else {
            AssemblyState::Done { acc }
        }
    }
}

/// Persona first, then the caller's prior history in order, then the prompt.
fn initial_messages(system_prompt: &str, prompt: &str, history: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(Message::user(prompt));
    messages
}

/// Continuation context: persona, original prompt, the entire text assembled
/// so far as assistant, and the fixed continue instruction. The full text is
/// supplied (not only the last fragment) so the provider can judge where the
/// narrative left off.
fn continuation_messages(system_prompt: &str, prompt: &str, assembled: &str) -> Vec<Message> {
    vec![
        Message::system(system_prompt),
        Message::user(prompt),
        Message::assistant(assembled),
        Message::user(CONTINUE_INSTRUCTION),
    ]
}

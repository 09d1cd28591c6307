//! Assistant reply generation
//!
//! Builds a short transcript prompt from the latest turns and asks the
//! inference service to continue it. The people on the other end may be
//! having a hard time, so they never see a technical error: any failure
//! becomes [`FALLBACK_REPLY`].

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::registry::ChatMessage;
use std::sync::Arc;

/// How many earlier messages go into the prompt
pub const CONTEXT_TURNS: usize = 4;

/// Sent instead of a generated reply whenever generation fails
pub const FALLBACK_REPLY: &str = "Let's focus on something fun! 😊 What's a highlight from today?";

const ASSISTANT_MARKER: &str = "assistant:";

#[derive(Clone)]
pub struct ResponseGenerator {
    llm: Arc<dyn LlmService>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Reply to `prompt`, or the fallback message if anything goes wrong.
    pub async fn generate_response(&self, context: &[ChatMessage], prompt: &str) -> String {
        match self.try_generate(context, prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = e.kind.as_str(),
                    "Reply generation failed, sending fallback"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub async fn try_generate(
        &self,
        context: &[ChatMessage],
        prompt: &str,
    ) -> Result<String, LlmError> {
        let request = LlmRequest::new(build_prompt(context, prompt));
        let response = self.llm.complete(&request).await?;
        extract_reply(&response.text)
            .ok_or_else(|| LlmError::malformed("Generated text had no reply after the marker"))
    }
}

/// Format the last [`CONTEXT_TURNS`] messages plus the new prompt as a
/// transcript ending in an open `assistant:` turn.
pub fn build_prompt(context: &[ChatMessage], prompt: &str) -> String {
    let start = context.len().saturating_sub(CONTEXT_TURNS);
    let mut text = context[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    text.push_str("\nuser: ");
    text.push_str(prompt);
    text.push('\n');
    text.push_str(ASSISTANT_MARKER);
    text
}

/// Text after the last `assistant:` marker, trimmed. `None` if that is empty.
pub fn extract_reply(generated: &str) -> Option<String> {
    let tail = generated
        .rsplit_once(ASSISTANT_MARKER)
        .map_or(generated, |(_, after)| after);
    let reply = tail.trim();
    (!reply.is_empty()).then(|| reply.to_string())
}

use super::{BackendError, ChatBackend, ChatMessage, InvocationResult, Role, TokenUsage, ToolDeclaration};

const REPLY_PREVIEW_CHARS: usize = 200;

/// Local stub model that never calls tools.
///
/// Replies with the upper-cased model name followed by the user's
/// instructions, and reports character counts as token usage. Useful for
/// dry runs of the harness plumbing without any provider.
pub struct EchoBackend {
    name: String,
}

impl EchoBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn summarize(text: &str) -> String {
        if text.chars().count() <= REPLY_PREVIEW_CHARS {
            return text.to_string();
        }
        let preview: String = text.chars().take(REPLY_PREVIEW_CHARS).collect();
        format!("{} …", preview)
    }
}

impl ChatBackend for EchoBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDeclaration],
    ) -> Result<InvocationResult, BackendError> {
        let mut instructions = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");

        if instructions.is_empty() {
            instructions = "No user instructions provided.".to_string();
        }

        let reply = format!(
            "[{}] {}",
            self.name.to_uppercase(),
            Self::summarize(&instructions)
        );
        let usage = TokenUsage::new(
            instructions.chars().count() as u64,
            reply.chars().count() as u64,
        );

        Ok(InvocationResult {
            text: reply,
            usage: Some(usage),
            executions: Vec::new(),
        })
    }
}

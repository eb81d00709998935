use super::{
    simulated_tool_result, tool_words, BackendError, ChatBackend, ChatMessage, InvocationResult,
    Role, TokenUsage, ToolDeclaration,
};

/// Local stub model that calls the tools its prompt asks for.
///
/// A declared tool is executed when its identifier, verbatim or read as
/// words, appears in the user prompt. Deterministic, so runs against it are
/// reproducible end to end.
pub struct MockBackend {
    name: String,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn requested<'a>(prompt: &str, tools: &'a [ToolDeclaration]) -> Vec<&'a ToolDeclaration> {
        let haystack = prompt.to_lowercase();
        tools
            .iter()
            .filter(|tool| {
                let words = tool_words(&tool.name);
                haystack.contains(&tool.name.to_lowercase())
                    || (!words.is_empty() && haystack.contains(&words))
            })
            .collect()
    }
}

impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> Result<InvocationResult, BackendError> {
        let prompt = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let executions: Vec<_> = Self::requested(&prompt, tools)
            .into_iter()
            .map(|tool| super::ToolExecution {
                tool: Some(tool.name.clone()),
                arguments: Some("{}".to_string()),
                result: simulated_tool_result(&tool.name, "{}"),
            })
            .collect();

        let text = if executions.is_empty() {
            format!("[{}] no matching tool for this request", self.name)
        } else {
            format!("[{}] executed {} tool(s)", self.name, executions.len())
        };

        let input: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        let output = text.chars().count()
            + executions
                .iter()
                .map(|e| e.result.chars().count())
                .sum::<usize>();

        Ok(InvocationResult {
            text,
            usage: Some(TokenUsage::new(input as u64, output as u64)),
            executions,
        })
    }
}

//! Model backend contract
//!
//! Every model under test is driven through [`ChatBackend`]. The runner only
//! depends on this trait; concrete providers live in the submodules and are
//! selected by [`registry::ModelRegistry`].

pub mod echo;
pub mod mock;
pub mod openai;
pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use echo::EchoBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use registry::ModelRegistry;

/// Errors a backend can report for a single invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("model kept calling tools after {0} rounds")]
    ToolRoundsExceeded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A tool the backend may call during an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!(
            "Performs the '{}' operation. Invent any argument values you need.",
            tool_words(&name)
        );
        Self { name, description }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input += other.input;
        self.output += other.output;
    }
}

/// Evidence reported by a backend that a tool ran.
///
/// Only `result` takes part in scoring; name and arguments are kept for the
/// diagnostic trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub tool: Option<String>,
    pub arguments: Option<String>,
    pub result: String,
}

impl ToolExecution {
    pub fn with_result(result: impl Into<String>) -> Self {
        Self {
            tool: None,
            arguments: None,
            result: result.into(),
        }
    }
}

impl std::fmt::Display for ToolExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ToolExecution {{ tool: {}, arguments: {}, result: {} }}",
            self.tool.as_deref().unwrap_or("?"),
            self.arguments.as_deref().unwrap_or("{}"),
            self.result
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationResult {
    pub text: String,
    /// `None` when the provider did not report usage; counted as zero
    pub usage: Option<TokenUsage>,
    pub executions: Vec<ToolExecution>,
}

/// The capability every model under test exposes.
///
/// Implementations must tolerate repeated independent calls; the runner
/// invokes each backend sequentially per model but different models may run
/// on different threads.
pub trait ChatBackend: Send + Sync {
    /// Registry name, used for logging and output file naming
    fn name(&self) -> &str;

    fn invoke(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> Result<InvocationResult, BackendError>;
}

/// Result text produced by the harness-side executor for a simulated tool call
pub fn simulated_tool_result(tool: &str, arguments: &str) -> String {
    format!("{} executed with arguments {}", tool, arguments)
}

/// Read a tool identifier as lowercase words.
///
/// `add_two_numbers`, `add-two-numbers` and `addTwoNumbers` all give
/// `add two numbers`.
pub fn tool_words(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !words.ends_with(' ') && !words.is_empty() {
                words.push(' ');
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !words.ends_with(' ') {
            words.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        words.extend(c.to_lowercase());
    }
    words.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_words() {
        assert_eq!(tool_words("add_two_numbers"), "add two numbers");
        assert_eq!(tool_words("add-two-numbers"), "add two numbers");
        assert_eq!(tool_words("addTwoNumbers"), "add two numbers");
        assert_eq!(tool_words("__get__Weather__"), "get weather");
        assert_eq!(tool_words("sha256Hash"), "sha256 hash");
    }

    #[test]
    fn test_token_usage_add() {
        let mut usage = TokenUsage::new(10, 5);
        usage.add(TokenUsage::new(3, 2));
        assert_eq!(usage, TokenUsage::new(13, 7));
    }

    #[test]
    fn test_execution_display_includes_result() {
        let exec = ToolExecution {
            tool: Some("add".into()),
            arguments: Some("{\"a\":1}".into()),
            result: "add -> 3".into(),
        };
        let rendered = exec.to_string();
        assert!(rendered.contains("tool: add"));
        assert!(rendered.contains("result: add -> 3"));
    }
}

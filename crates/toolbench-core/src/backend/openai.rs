//! OpenAI-compatible chat-completions backend
//!
//! Declares every catalog tool as a function, executes the calls the model
//! makes with the harness-side simulated executor, and feeds results back
//! until the model answers without calling tools.

use std::time::Duration;

use serde_json::{json, Value};

use super::{
    simulated_tool_result, BackendError, ChatBackend, ChatMessage, InvocationResult, TokenUsage,
    ToolDeclaration, ToolExecution,
};

/// Default base URL for the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Default cap on model/tool round trips per invocation
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Provider-side model identifier
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub max_tool_rounds: usize,
    pub temperature: Option<f64>,
}

impl OpenAiSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            temperature: None,
        }
    }
}

pub struct OpenAiBackend {
    name: String,
    settings: OpenAiSettings,
    agent: ureq::Agent,
}

impl OpenAiBackend {
    pub fn new(name: impl Into<String>, settings: OpenAiSettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_seconds)))
            .build();
        Self {
            name: name.into(),
            settings,
            agent: config.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> Result<String, BackendError> {
        std::env::var(&self.settings.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                BackendError::Unavailable(format!(
                    "environment variable {} is not set",
                    self.settings.api_key_env
                ))
            })
    }

    fn post(&self, api_key: &str, body: &Value) -> Result<Value, BackendError> {
        let response = self
            .agent
            .post(&self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .send_json(body);

        match response {
            Ok(mut res) => res
                .body_mut()
                .read_json::<Value>()
                .map_err(|e| BackendError::InvalidResponse(e.to_string())),
            Err(ureq::Error::StatusCode(code)) => Err(BackendError::Status {
                code,
                body: String::new(),
            }),
            Err(e) => Err(BackendError::Transport(e.to_string())),
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> Result<InvocationResult, BackendError> {
        let api_key = self.api_key()?;

        let mut conversation: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        let mut usage = None::<TokenUsage>;
        let mut executions = Vec::new();

        for round in 0..self.settings.max_tool_rounds {
            let body = request_body(&self.settings, &conversation, tools);
            let response = self.post(&api_key, &body)?;
            let turn = parse_turn(&response)?;

            if let Some(turn_usage) = turn.usage {
                usage.get_or_insert_with(TokenUsage::default).add(turn_usage);
            }

            if turn.tool_calls.is_empty() {
                return Ok(InvocationResult {
                    text: turn.text,
                    usage,
                    executions,
                });
            }

            tracing::debug!(
                model = %self.name,
                round,
                calls = turn.tool_calls.len(),
                "tool_round"
            );

            conversation.push(turn.assistant_message);
            for call in turn.tool_calls {
                let result = simulated_tool_result(&call.name, &call.arguments);
                conversation.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": result,
                }));
                executions.push(ToolExecution {
                    tool: Some(call.name),
                    arguments: Some(call.arguments),
                    result,
                });
            }
        }

        Err(BackendError::ToolRoundsExceeded(
            self.settings.max_tool_rounds,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ToolCall {
    id: String,
    name: String,
    arguments: String,
}

#[derive(Debug)]
struct Turn {
    text: String,
    usage: Option<TokenUsage>,
    tool_calls: Vec<ToolCall>,
    assistant_message: Value,
}

fn request_body(settings: &OpenAiSettings, conversation: &[Value], tools: &[ToolDeclaration]) -> Value {
    let mut body = json!({
        "model": settings.model,
        "messages": conversation,
    });

    if !tools.is_empty() {
        body["tools"] = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": {
                            "type": "object",
                            "properties": {},
                            "additionalProperties": true,
                        },
                    },
                })
            })
            .collect::<Vec<_>>()
            .into();
    }

    if let Some(temperature) = settings.temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

fn parse_turn(response: &Value) -> Result<Turn, BackendError> {
    let message = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .ok_or_else(|| BackendError::InvalidResponse("missing choices[0].message".into()))?;

    let text = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let usage = response.get("usage").map(|u| {
        TokenUsage::new(
            u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            u.get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        )
    });

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
        for call in calls {
            let function = call
                .get("function")
                .ok_or_else(|| BackendError::InvalidResponse("tool call without function".into()))?;
            let name = function
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| BackendError::InvalidResponse("tool call without name".into()))?;
            tool_calls.push(ToolCall {
                id: call
                    .get("id")
                    .and_then(|i| i.as_str())
                    .unwrap_or_default()
                    .to_string(),
                name: name.to_string(),
                arguments: function
                    .get("arguments")
                    .and_then(|a| a.as_str())
                    .unwrap_or("{}")
                    .to_string(),
            });
        }
    }

    Ok(Turn {
        text,
        usage,
        tool_calls,
        assistant_message: message.clone(),
    })
}

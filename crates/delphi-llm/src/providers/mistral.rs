//! Mistral chat-completions provider
//!
//! Implements [`LLMProvider`] against `POST {api_base}/chat/completions`.
//! See: https://docs.mistral.ai/api/#tag/chat
//!
//! # Example
//!
//! ```no_run
//! use delphi_llm::{CompletionRequest, LLMProvider, Message};
//! use delphi_llm::providers::{MistralConfig, MistralProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MistralProvider::with_config(MistralConfig::new("key").with_timeout(60))?;
//!
//! let request = CompletionRequest::builder("mistral-small-latest")
//!     .add_message(Message::user("Summarise NVDA in one line"))
//!     .max_tokens(100)
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolChoice, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Mistral provider
#[derive(Debug, Clone)]
pub struct MistralConfig {
    /// API key for bearer authentication
    pub api_key: String,

    /// Base URL of the API (default: "https://api.mistral.ai/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl MistralConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_MISTRAL_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom API base URL (proxies, self-hosted gateways)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Mistral chat-completions provider
pub struct MistralProvider {
    client: Client,
    config: MistralConfig,
}

impl MistralProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: MistralConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &MistralConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for MistralProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending chat completion request");

        let wire_request = build_wire_request(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&wire_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 | 422 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(wire_request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let wire_response: MistralResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        into_completion(wire_response)
    }

    fn name(&self) -> &'static str {
        "mistral"
    }
}

// ============================================================================
// Wire request types
// ============================================================================

#[derive(Debug, Serialize)]
struct MistralRequest {
    model: String,
    messages: Vec<MistralMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<MistralTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct MistralMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<MistralToolCall>>,
}

#[derive(Debug, Serialize)]
struct MistralTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: MistralFunction,
}

#[derive(Debug, Serialize)]
struct MistralFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct MistralToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: MistralFunctionCall,
}

#[derive(Debug, Serialize)]
struct MistralFunctionCall {
    name: String,
    arguments: String,
}

// ============================================================================
// Wire response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MistralResponse {
    choices: Vec<MistralChoice>,
    #[serde(default)]
    usage: MistralUsage,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MistralResponseMessage {
    /// A plain string, or an array of typed chunks on some models
    #[serde(default)]
    content: Value,
    #[serde(default)]
    tool_calls: Option<Vec<MistralResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct MistralResponseToolCall {
    #[serde(default)]
    id: String,
    function: MistralResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct MistralResponseFunctionCall {
    name: String,
    /// Usually a JSON-encoded string, occasionally an inline object
    arguments: Value,
}

#[derive(Debug, Default, Deserialize)]
struct MistralUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

fn build_wire_request(request: CompletionRequest) -> MistralRequest {
    let tools = request.tools.as_deref().map(convert_tools);
    // tool_choice without tools is rejected by the API
    let tool_choice = tools.as_ref().and(request.tool_choice);

    MistralRequest {
        model: request.model,
        messages: build_messages(request.system, request.messages),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools,
        tool_choice,
    }
}

/// The system prompt travels as the first message
fn build_messages(system: Option<String>, messages: Vec<Message>) -> Vec<MistralMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);

    if let Some(sys) = system {
        result.push(MistralMessage {
            role: "system",
            content: sys,
            tool_calls: None,
        });
    }

    result.extend(messages.into_iter().map(convert_message));
    result
}

fn convert_message(msg: Message) -> MistralMessage {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    match msg.content {
        Some(MessageContent::Text(text)) => MistralMessage {
            role,
            content: text,
            tool_calls: None,
        },
        Some(MessageContent::Blocks(blocks)) => {
            let mut content = String::new();
            let mut tool_calls = Vec::new();

            for block in blocks {
                match block {
                    ContentBlock::Text { text } => content.push_str(&text),
                    ContentBlock::ToolUse { id, name, input } => tool_calls.push(MistralToolCall {
                        id,
                        tool_type: "function",
                        function: MistralFunctionCall {
                            name,
                            arguments: input.to_string(),
                        },
                    }),
                }
            }

            MistralMessage {
                role,
                content,
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            }
        }
        None => MistralMessage {
            role,
            content: String::new(),
            tool_calls: None,
        },
    }
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<MistralTool> {
    tools
        .iter()
        .map(|tool| MistralTool {
            tool_type: "function",
            function: MistralFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn into_completion(response: MistralResponse) -> Result<CompletionResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let finish_reason = choice.finish_reason.unwrap_or_default();
    debug!(
        finish_reason = %finish_reason,
        input_tokens = response.usage.prompt_tokens,
        output_tokens = response.usage.completion_tokens,
        "Received chat completion"
    );

    Ok(CompletionResponse {
        message: parse_response_message(choice.message),
        stop_reason: map_stop_reason(&finish_reason),
        usage: TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        },
    })
}

fn parse_response_message(msg: MistralResponseMessage) -> Message {
    let mut blocks = Vec::new();

    let content = content_text(msg.content);
    if !content.is_empty() {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        blocks.push(ContentBlock::ToolUse {
            input: decode_arguments(&call.function.name, call.function.arguments),
            id: call.id,
            name: call.function.name,
        });
    }

    Message::assistant_blocks(blocks)
}

/// Flatten message content to text; non-text chunks are skipped
fn content_text(content: Value) -> String {
    match content {
        Value::String(text) => text,
        Value::Array(chunks) => chunks
            .iter()
            .filter(|chunk| chunk.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
            .filter_map(|chunk| chunk.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

/// Unparseable argument strings decode to `null` so one bad call does not
/// poison the rest of the response.
fn decode_arguments(tool_name: &str, arguments: Value) -> Value {
    match arguments {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(tool_name = %tool_name, error = %e, "Tool call arguments are not valid JSON");
            Value::Null
        }),
        other => other,
    }
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" | "model_length" => StopReason::MaxTokens,
        "tool_calls" => StopReason::ToolUse,
        _ => {
            debug!("Unknown finish reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

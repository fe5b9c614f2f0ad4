//! Chat-completion abstraction layer for Delphi
//!
//! This crate provides provider-agnostic types for talking to a chat model
//! with function calling. It includes:
//!
//! - Message types for model communication
//! - Completion request/response types
//! - Tool definitions and JSON-schema helpers for function calling
//! - The `LLMProvider` trait
//! - The Mistral chat-completions provider

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage, ToolChoice};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use providers::{MistralConfig, MistralProvider};
pub use tools::ToolDefinition;

//! Tool-calling research agent

use crate::error::Result;
use crate::prompts;
use crate::tools::{Capability, ToolRegistry};
use delphi_llm::{CompletionRequest, ContentBlock, LLMProvider, Message, ToolChoice};
use futures::future::join_all;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Bundle key used when the model selects no tools
pub const NO_TOOLS_KEY: &str = "summary";

/// Note stored under [`NO_TOOLS_KEY`]
pub const NO_TOOLS_NOTE: &str = "No data gathered as no tools were selected.";

/// Tool results keyed by tool name
///
/// Keys keep the order they were first inserted in. Inserting an existing
/// key replaces its value without moving it. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchBundle {
    entries: Vec<(String, Value)>,
}

impl ResearchBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding only the no-tools diagnostic note
    pub fn no_tools_selected() -> Self {
        let mut bundle = Self::new();
        bundle.insert(NO_TOOLS_KEY, Value::String(NO_TOOLS_NOTE.to_string()));
        bundle
    }

    /// Insert a result, replacing any earlier result for the same tool
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indented JSON rendering, as embedded in the analyst prompt
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for ResearchBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Research agent
///
/// Sends the ticker and query to the model together with every tool
/// definition, executes the tool calls the model returns concurrently, and
/// collects the results in request order.
#[derive(Clone)]
pub struct Researcher {
    provider: Option<Arc<dyn LLMProvider>>,
    registry: ToolRegistry,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl Researcher {
    /// Create a researcher; `None` as provider disables it
    pub fn new(
        provider: Option<Arc<dyn LLMProvider>>,
        registry: ToolRegistry,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Set the completion token limit
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The tool registry this researcher dispatches to
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Gather data for `query` about `ticker`
    ///
    /// Never fails. An unconfigured or failing model yields an empty bundle;
    /// a model that selects no tools yields [`ResearchBundle::no_tools_selected`].
    pub async fn run_research(&self, ticker: &str, query: &str) -> ResearchBundle {
        let Some(provider) = &self.provider else {
            error!("Researcher not configured (MISTRAL_API_KEY missing), returning empty bundle");
            return ResearchBundle::new();
        };

        info!(ticker = %ticker, "Researcher starting");

        let message = match self.select_tools(provider.as_ref(), ticker, query).await {
            Ok(message) => message,
            Err(e) => {
                error!(ticker = %ticker, error = %e, "Researcher model call failed, returning empty bundle");
                return ResearchBundle::new();
            }
        };

        let tool_uses = message.tool_uses();
        if tool_uses.is_empty() {
            info!(ticker = %ticker, "Model selected no tools");
            return ResearchBundle::no_tools_selected();
        }

        let calls: Vec<Capability> = tool_uses
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    debug!(tool_name = %name, tool_id = %id, input = %input, "Model requested tool");
                    self.registry.decode(name, input)
                }
                ContentBlock::Text { .. } => None,
            })
            .collect();

        if calls.is_empty() {
            warn!(ticker = %ticker, "Model requested only unknown tools");
            return ResearchBundle::new();
        }

        info!(tool_count = calls.len(), "Starting tool execution");
        let start_time = Instant::now();

        let results = join_all(calls.iter().map(|call| self.registry.execute(call))).await;

        let mut bundle = ResearchBundle::new();
        for (call, result) in calls.iter().zip(results) {
            bundle.insert(call.name(), result);
        }

        info!(
            tool_count = calls.len(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            keys = ?bundle.keys().collect::<Vec<_>>(),
            "Researcher finished gathering data"
        );

        bundle
    }

    async fn select_tools(
        &self,
        provider: &dyn LLMProvider,
        ticker: &str,
        query: &str,
    ) -> Result<Message> {
        let mut builder = CompletionRequest::builder(&self.model)
            .system(prompts::RESEARCHER_SYSTEM)
            .add_message(Message::user(prompts::researcher_user(ticker, query)?))
            .max_tokens(self.max_tokens)
            .tools(self.registry.definitions())
            .tool_choice(ToolChoice::Auto);

        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = provider.complete(builder.build()).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            total_tokens = response.usage.total(),
            "Researcher model responded"
        );

        Ok(response.message)
    }
}

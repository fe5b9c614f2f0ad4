//! Report-writing agent

use crate::agents::researcher::ResearchBundle;
use crate::error::{DelphiError, Result};
use crate::prompts;
use delphi_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{error, info};

/// Report returned when no model is configured
pub const NOT_CONFIGURED_REPORT: &str = "Error: Analyst agent not configured.";

/// Analyst agent
///
/// Writes a Markdown investment summary from a research bundle with a single
/// model call.
#[derive(Clone)]
pub struct Analyst {
    provider: Option<Arc<dyn LLMProvider>>,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl Analyst {
    /// Create an analyst; `None` as provider disables it
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 2048,
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

    /// Write the report for `query`
    ///
    /// Returns the model's text verbatim. Failures are reported in the
    /// returned string rather than as an error.
    pub async fn synthesize(&self, bundle: &ResearchBundle, query: &str) -> String {
        let Some(provider) = &self.provider else {
            error!("Analyst not configured (MISTRAL_API_KEY missing)");
            return NOT_CONFIGURED_REPORT.to_string();
        };

        info!(entries = bundle.len(), "Analyst starting");

        match self.write_report(provider.as_ref(), bundle, query).await {
            Ok(report) => {
                info!(report_length = report.len(), "Analyst finished");
                report
            }
            Err(e) => {
                error!(error = %e, "Analyst model call failed");
                format!("Error: Analyst failed to generate a report: {e}")
            }
        }
    }

    async fn write_report(
        &self,
        provider: &dyn LLMProvider,
        bundle: &ResearchBundle,
        query: &str,
    ) -> Result<String> {
        let user_prompt = prompts::analyst_user(query, &bundle.to_pretty_json())?;

        let mut builder = CompletionRequest::builder(&self.model)
            .system(prompts::ANALYST_SYSTEM)
            .add_message(Message::user(user_prompt))
            .max_tokens(self.max_tokens);

        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = provider.complete(builder.build()).await?;

        response
            .message
            .text()
            .map(str::to_string)
            .ok_or_else(|| {
                DelphiError::Model(delphi_llm::LLMError::UnexpectedResponse(
                    "model returned no text".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{ScriptedProvider, text, tool_calls};
    use delphi_llm::LLMError;
    use serde_json::json;

    fn analyst(provider: &Arc<ScriptedProvider>) -> Analyst {
        Analyst::new(Some(provider.clone() as Arc<dyn LLMProvider>), "mistral-small-latest")
    }

    #[tokio::test]
    async fn test_report_is_returned_verbatim() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text("# NVDA\n\n**Strong** quarter."))]));

        let mut bundle = ResearchBundle::new();
        bundle.insert("fetch_company_overview", json!({"Symbol": "NVDA"}));

        let report = analyst(&provider).synthesize(&bundle, "Is NVDA a buy?").await;
        assert_eq!(report, "# NVDA\n\n**Strong** quarter.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(prompts::ANALYST_SYSTEM));
        assert!(requests[0].tools.is_none());

        let prompt = requests[0].messages[0].text().unwrap();
        assert!(prompt.contains("\"Is NVDA a buy?\""));
        assert!(prompt.contains("\"Symbol\": \"NVDA\""));
    }

    #[tokio::test]
    async fn test_model_failure_yields_failure_report() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(LLMError::RateLimitExceeded(
            "slow down".to_string(),
        ))]));

        let report = analyst(&provider).synthesize(&ResearchBundle::new(), "q").await;
        assert!(report.starts_with("Error:"));
        assert!(report.contains("slow down"));
    }

    #[tokio::test]
    async fn test_response_without_text_yields_failure_report() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(tool_calls(&[(
            "fetch_news",
            json!({"query": "NVDA"}),
        )]))]));

        let report = analyst(&provider).synthesize(&ResearchBundle::new(), "q").await;
        assert!(report.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_unconfigured_analyst() {
        let analyst = Analyst::new(None, "mistral-small-latest");
        let report = analyst.synthesize(&ResearchBundle::no_tools_selected(), "q").await;
        assert_eq!(report, NOT_CONFIGURED_REPORT);
    }
}

//! Research workflow: research, analyse, chart
//!
//! [`ResearchWorkflow::from_config`] builds every client once; the workflow is
//! then cloned into each background task.

use crate::agents::{Analyst, Researcher, render_chart};
use crate::api::{AlphaVantageClient, HttpTransport, NewsApiClient, ReqwestTransport};
use crate::cache::ApiCache;
use crate::config::DelphiConfig;
use crate::error::Result;
use crate::models::{ResearchQuery, TaskResponse};
use crate::tasks::TaskStore;
use crate::tools::ToolRegistry;
use delphi_llm::{LLMProvider, MistralConfig, MistralProvider};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// The full research pipeline plus the store its outcomes are written to
#[derive(Clone)]
pub struct ResearchWorkflow {
    researcher: Researcher,
    analyst: Analyst,
    prices: Option<AlphaVantageClient>,
    tasks: TaskStore,
}

impl ResearchWorkflow {
    pub fn new(
        researcher: Researcher,
        analyst: Analyst,
        prices: Option<AlphaVantageClient>,
        tasks: TaskStore,
    ) -> Self {
        Self {
            researcher,
            analyst,
            prices,
            tasks,
        }
    }

    /// Wire the workflow from configuration
    ///
    /// A missing credential disables the matching component and logs a
    /// warning; it is not an error.
    pub fn from_config(config: &DelphiConfig) -> Result<Self> {
        let provider: Option<Arc<dyn LLMProvider>> = match &config.mistral_api_key {
            Some(key) => {
                let mistral = MistralConfig::new(key).with_api_base(&config.mistral_api_base);
                let provider: Arc<dyn LLMProvider> = Arc::new(MistralProvider::with_config(mistral)?);
                Some(provider)
            }
            None => {
                warn!("MISTRAL_API_KEY not set, researcher and analyst disabled");
                None
            }
        };

        Self::with_provider(config, provider)
    }

    /// Wire the workflow from configuration around an existing chat model
    pub fn with_provider(config: &DelphiConfig, provider: Option<Arc<dyn LLMProvider>>) -> Result<Self> {
        config.validate()?;

        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        let cache = ApiCache::new(config.cache_max_entries, config.cache_ttl);

        let news = match &config.news_api_key {
            Some(key) => Some(NewsApiClient::new(
                Arc::clone(&transport),
                cache.clone(),
                key,
                &config.news_api_base_url,
                config.news_page_size,
            )),
            None => {
                warn!("NEWS_API_KEY not set, news tool disabled");
                None
            }
        };

        let financials = match &config.alpha_vantage_api_key {
            Some(key) => Some(AlphaVantageClient::new(
                Arc::clone(&transport),
                cache,
                key,
                &config.alpha_vantage_base_url,
            )),
            None => {
                warn!("ALPHA_VANTAGE_API_KEY not set, company overview and price history disabled");
                None
            }
        };

        let registry = ToolRegistry::new(news, financials.clone());

        let researcher = Researcher::new(provider.clone(), registry, &config.model)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);
        let analyst = Analyst::new(provider, &config.model)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);

        info!(
            model = %config.model,
            cache_entries = config.cache_max_entries,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            max_tokens = config.max_tokens,
            task_retention_secs = config.task_ttl.as_secs(),
            "Research workflow configured"
        );

        let tasks = TaskStore::new(config.task_max_entries, config.task_ttl);
        Ok(Self::new(researcher, analyst, financials, tasks))
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Register a task and run the workflow for it in the background
    ///
    /// Returns as soon as the task is recorded as `PENDING`. If the workflow
    /// task panics, the record is marked `FAILED`.
    pub async fn submit(&self, query: ResearchQuery) -> TaskResponse {
        let task_id = Uuid::new_v4();
        self.tasks.create(task_id, &query).await;

        let workflow = self.clone();
        let span = info_span!("research_task", task_id = %task_id, ticker = %query.ticker);

        tokio::spawn(
            async move {
                let runner = workflow.clone();
                let handle = tokio::spawn(async move { runner.run(task_id, query).await }.in_current_span());

                if let Err(e) = handle.await {
                    error!(error = %e, "Research task aborted");
                    workflow.tasks.fail(task_id, format!("workflow aborted: {e}")).await;
                }
            }
            .instrument(span),
        );

        TaskResponse::pending(task_id)
    }

    /// Run research, analysis, and charting for `query`, recording the outcome
    pub async fn run(&self, task_id: Uuid, query: ResearchQuery) {
        info!(task_id = %task_id, ticker = %query.ticker, "Research workflow started");
        self.tasks.mark_running(task_id).await;

        let bundle = self.researcher.run_research(&query.ticker, &query.query).await;

        let (report, points) = tokio::join!(
            self.analyst.synthesize(&bundle, &query.query),
            self.price_history(&query.ticker),
        );
        let chart = render_chart(&points);

        let research = match serde_json::to_value(&bundle) {
            Ok(value) => value,
            Err(e) => {
                self.tasks.fail(task_id, format!("could not serialize research: {e}")).await;
                return;
            }
        };

        info!(
            task_id = %task_id,
            report_length = report.len(),
            has_chart = !chart.is_empty(),
            "Research workflow completed"
        );
        self.tasks.complete(task_id, research, report, chart).await;
    }

    async fn price_history(&self, ticker: &str) -> Vec<crate::api::PricePoint> {
        match &self.prices {
            Some(client) => client.fetch_price_history(ticker).await,
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{ScriptedProvider, text, tool_calls};
    use crate::api::transport::MockHttpTransport;
    use crate::tasks::TaskStatus;
    use serde_json::json;
    use std::time::Duration;

    fn mock_transport() -> MockHttpTransport {
        let mut transport = MockHttpTransport::new();
        transport.expect_get_json().returning(|_, query| {
            let function = query
                .iter()
                .find(|(k, _)| k == "function")
                .map(|(_, v)| v.as_str());
            match function {
                Some("OVERVIEW") => Ok(json!({"Symbol": "NVDA", "Name": "NVIDIA Corporation"})),
                Some("TIME_SERIES_DAILY") => Ok(json!({
                    "Time Series (Daily)": {
                        "2024-01-02": {"4. close": "100.0"},
                        "2024-01-01": {"4. close": "90.0"}
                    }
                })),
                _ => Ok(json!({"articles": [{"source": {"name": "Reuters"}, "title": "t", "content": "c"}]})),
            }
        });
        transport
    }

    fn workflow(provider: Arc<ScriptedProvider>) -> ResearchWorkflow {
        let transport: Arc<dyn HttpTransport> = Arc::new(mock_transport());
        let cache = ApiCache::default();
        let news = NewsApiClient::new(Arc::clone(&transport), cache.clone(), "k", "https://news.test", 5);
        let financials = AlphaVantageClient::new(transport, cache, "k", "https://av.test");

        let provider: Arc<dyn LLMProvider> = provider;
        let registry = ToolRegistry::new(Some(news), Some(financials.clone()));

        ResearchWorkflow::new(
            Researcher::new(Some(Arc::clone(&provider)), registry, "mistral-small-latest"),
            Analyst::new(Some(provider), "mistral-small-latest"),
            Some(financials),
            TaskStore::default(),
        )
    }

    #[tokio::test]
    async fn test_run_records_completed_task() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_calls(&[
                ("fetch_news", json!({"query": "NVDA"})),
                ("fetch_company_overview", json!({"ticker": "NVDA"})),
            ])),
            Ok(text("# NVIDIA\n\nSolid.")),
        ]));
        let workflow = workflow(provider);
        let query = ResearchQuery::new("NVDA", "Outlook?");
        let id = Uuid::new_v4();
        workflow.tasks().create(id, &query).await;

        workflow.run(id, query).await;

        let record = workflow.tasks().get(id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.report.as_deref(), Some("# NVIDIA\n\nSolid."));
        assert!(!record.chart.unwrap_or_default().is_empty());

        let research = record.research.unwrap();
        assert_eq!(research["fetch_company_overview"]["Symbol"], json!("NVDA"));
        assert_eq!(research["fetch_news"][0]["source"], json!("Reuters"));
    }

    #[tokio::test]
    async fn test_submit_returns_pending_and_completes_in_background() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text("no tools")), Ok(text("report"))]));
        let workflow = workflow(provider);

        let response = workflow.submit(ResearchQuery::new("NVDA", "q")).await;
        assert_eq!(response.status, "PENDING");

        let id: Uuid = response.task_id.parse().unwrap();
        let mut status = TaskStatus::Pending;
        for _ in 0..100 {
            status = workflow.tasks().get(id).await.unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, TaskStatus::Completed);

        let record = workflow.tasks().get(id).await.unwrap();
        assert_eq!(
            record.research,
            Some(json!({"summary": "No data gathered as no tools were selected."}))
        );
    }

    #[tokio::test]
    async fn test_configured_generation_settings_reach_both_agents() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text("no tools")), Ok(text("report"))]));
        let config = DelphiConfig::builder()
            .max_tokens(4096)
            .temperature(0.5)
            .build()
            .unwrap();
        let workflow =
            ResearchWorkflow::with_provider(&config, Some(provider.clone() as Arc<dyn LLMProvider>)).unwrap();

        let query = ResearchQuery::new("NVDA", "q");
        let id = Uuid::new_v4();
        workflow.tasks().create(id, &query).await;
        workflow.run(id, query).await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.max_tokens, 4096);
            assert_eq!(request.temperature, Some(0.5));
        }
        assert_eq!(
            workflow.tasks().get(id).await.unwrap().report.as_deref(),
            Some("report")
        );
    }

    #[tokio::test]
    async fn test_unconfigured_workflow_still_completes() {
        let workflow = ResearchWorkflow::from_config(&DelphiConfig::default()).unwrap();
        let query = ResearchQuery::new("NVDA", "q");
        let id = Uuid::new_v4();
        workflow.tasks().create(id, &query).await;

        workflow.run(id, query).await;

        let record = workflow.tasks().get(id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.report.as_deref(), Some("Error: Analyst agent not configured."));
        assert_eq!(record.chart.as_deref(), Some(""));
        assert_eq!(record.research, Some(json!({})));
    }
}

//! Tools the researcher model may call
//!
//! Each tool is one [`Capability`] variant carrying its typed arguments. The
//! model's `(name, arguments)` pair is decoded into a variant; anything that
//! does not decode is skipped by the caller.

use crate::api::{AlphaVantageClient, NewsApiClient};
use delphi_llm::ToolDefinition;
use delphi_llm::tools::schema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Arguments of `fetch_news`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArgs {
    /// Company ticker or name to search news for
    pub query: String,
}

/// Arguments of `fetch_company_overview`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewArgs {
    /// Stock ticker symbol
    pub ticker: String,
}

/// A decoded tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum Capability {
    FetchNews(NewsArgs),
    FetchCompanyOverview(OverviewArgs),
}

impl Capability {
    pub const FETCH_NEWS: &'static str = "fetch_news";
    pub const FETCH_COMPANY_OVERVIEW: &'static str = "fetch_company_overview";

    /// Every tool name, in advertisement order
    pub const NAMES: [&'static str; 2] = [Self::FETCH_NEWS, Self::FETCH_COMPANY_OVERVIEW];

    /// Tool name as advertised to the model
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchNews(_) => Self::FETCH_NEWS,
            Self::FetchCompanyOverview(_) => Self::FETCH_COMPANY_OVERVIEW,
        }
    }

    /// Decode a model tool call
    ///
    /// Returns `None` for unknown tool names and for arguments that do not
    /// match the tool's parameters.
    pub fn decode(name: &str, arguments: &Value) -> Option<Self> {
        if !Self::NAMES.iter().any(|known| *known == name) {
            debug!(tool_name = %name, "Skipping unknown tool");
            return None;
        }

        let tagged = json!({ "name": name, "arguments": arguments });
        match serde_json::from_value(tagged) {
            Ok(capability) => Some(capability),
            Err(e) => {
                warn!(tool_name = %name, arguments = %arguments, error = %e, "Skipping tool call with invalid arguments");
                None
            }
        }
    }

    /// The value this tool yields when its provider fails or is unconfigured
    pub fn empty_result(&self) -> Value {
        match self {
            Self::FetchNews(_) => json!([]),
            Self::FetchCompanyOverview(_) => json!({}),
        }
    }

    /// Tool definitions sent to the model
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                Self::FETCH_NEWS,
                "Fetches recent news articles for a given company ticker or name.",
                schema::object(
                    json!({
                        "query": schema::string("The company ticker or name to search news for."),
                    }),
                    vec!["query"],
                ),
            ),
            ToolDefinition::new(
                Self::FETCH_COMPANY_OVERVIEW,
                "Fetches company overview and key financial metrics from Alpha Vantage.",
                schema::object(
                    json!({
                        "ticker": schema::string("The stock ticker symbol of the company."),
                    }),
                    vec!["ticker"],
                ),
            ),
        ]
    }
}

/// Binds each capability to its provider client
///
/// A `None` client means the provider's credential is missing; its tool is
/// still advertised but always yields the empty value.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    news: Option<NewsApiClient>,
    financials: Option<AlphaVantageClient>,
}

impl ToolRegistry {
    /// Create a registry from the configured clients
    pub fn new(news: Option<NewsApiClient>, financials: Option<AlphaVantageClient>) -> Self {
        Self { news, financials }
    }

    /// Tool definitions sent to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Capability::definitions()
    }

    /// Decode a model tool call against this registry
    pub fn decode(&self, name: &str, arguments: &Value) -> Option<Capability> {
        Capability::decode(name, arguments)
    }

    /// Run a capability
    ///
    /// Never fails; provider errors and missing clients yield
    /// [`Capability::empty_result`].
    pub async fn execute(&self, capability: &Capability) -> Value {
        match capability {
            Capability::FetchNews(args) => match &self.news {
                Some(client) => {
                    let articles = client.fetch_news(&args.query).await;
                    serde_json::to_value(articles).unwrap_or_else(|_| capability.empty_result())
                }
                None => Self::unconfigured(capability, "NEWS_API_KEY"),
            },
            Capability::FetchCompanyOverview(args) => match &self.financials {
                Some(client) => Value::Object(client.fetch_company_overview(&args.ticker).await),
                None => Self::unconfigured(capability, "ALPHA_VANTAGE_API_KEY"),
            },
        }
    }

    fn unconfigured(capability: &Capability, credential: &str) -> Value {
        warn!(
            tool_name = capability.name(),
            credential, "Tool provider not configured, returning empty result"
        );
        capability.empty_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::MockHttpTransport;
    use crate::cache::ApiCache;
    use crate::error::DelphiError;
    use std::sync::Arc;

    #[test]
    fn test_decode_known_tools() {
        assert_eq!(
            Capability::decode("fetch_news", &json!({"query": "NVDA"})),
            Some(Capability::FetchNews(NewsArgs {
                query: "NVDA".to_string()
            }))
        );
        assert_eq!(
            Capability::decode("fetch_company_overview", &json!({"ticker": "NVDA"})),
            Some(Capability::FetchCompanyOverview(OverviewArgs {
                ticker: "NVDA".to_string()
            }))
        );
    }

    #[test]
    fn test_decode_skips_unknown_and_invalid() {
        assert_eq!(Capability::decode("fetch_weather", &json!({"city": "Paris"})), None);
        assert_eq!(Capability::decode("fetch_news", &json!({"ticker": "NVDA"})), None);
        assert_eq!(Capability::decode("fetch_news", &Value::Null), None);
        assert_eq!(Capability::decode("fetch_company_overview", &json!({"ticker": 7})), None);
    }

    #[test]
    fn test_definitions_match_names() {
        let definitions = Capability::definitions();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, Capability::NAMES);
        assert_eq!(definitions[0].input_schema["required"], json!(["query"]));
        assert_eq!(definitions[1].input_schema["required"], json!(["ticker"]));
    }

    #[test]
    fn test_empty_results() {
        let news = Capability::FetchNews(NewsArgs {
            query: "x".to_string(),
        });
        let overview = Capability::FetchCompanyOverview(OverviewArgs {
            ticker: "x".to_string(),
        });
        assert_eq!(news.empty_result(), json!([]));
        assert_eq!(overview.empty_result(), json!({}));
    }

    #[tokio::test]
    async fn test_unconfigured_registry_returns_empty_values() {
        let registry = ToolRegistry::default();

        let news = registry.decode("fetch_news", &json!({"query": "NVDA"})).unwrap();
        let overview = registry
            .decode("fetch_company_overview", &json!({"ticker": "NVDA"}))
            .unwrap();

        assert_eq!(registry.execute(&news).await, json!([]));
        assert_eq!(registry.execute(&overview).await, json!({}));
    }

    #[tokio::test]
    async fn test_execute_with_failing_provider() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get_json().returning(|url, _| {
            Err(DelphiError::Status {
                url: url.to_string(),
                status: 502,
                body: String::new(),
            })
        });
        let transport = Arc::new(transport);
        let cache = ApiCache::default();

        let registry = ToolRegistry::new(
            Some(NewsApiClient::new(transport.clone(), cache.clone(), "k", "https://news.test", 5)),
            Some(AlphaVantageClient::new(transport, cache, "k", "https://av.test")),
        );

        let news = Capability::FetchNews(NewsArgs {
            query: "NVDA".to_string(),
        });
        let overview = Capability::FetchCompanyOverview(OverviewArgs {
            ticker: "NVDA".to_string(),
        });

        assert_eq!(registry.execute(&news).await, json!([]));
        assert_eq!(registry.execute(&overview).await, json!({}));
    }
}

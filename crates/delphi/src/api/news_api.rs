//! NewsAPI client

use crate::api::transport::HttpTransport;
use crate::cache::{ApiCache, CacheKey};
use crate::error::{DelphiError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

const PROVIDER: &str = "newsapi";

/// News article reduced to the fields the analyst needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Publisher name
    pub source: String,
    pub title: String,
    /// Truncated body as served by NewsAPI (may be empty)
    pub content: String,
}

/// NewsAPI `everything` client
///
/// Responses are memoized in the shared [`ApiCache`] under `fetch_news(query)`.
#[derive(Clone)]
pub struct NewsApiClient {
    transport: Arc<dyn HttpTransport>,
    cache: ApiCache,
    api_key: String,
    base_url: String,
    page_size: u32,
}

impl NewsApiClient {
    /// Create a new NewsAPI client
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: ApiCache,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            transport,
            cache,
            api_key: api_key.into(),
            base_url: base_url.into(),
            page_size,
        }
    }

    /// Fetch the most recent English articles matching `query`
    ///
    /// Never fails: transport errors, non-2xx responses, and unusable
    /// payloads are logged and yield an empty list.
    pub async fn fetch_news(&self, query: &str) -> Vec<NewsArticle> {
        match self.try_fetch_news(query).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(query = %query, error = %e, "News fetch failed, returning no articles");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn try_fetch_news(&self, query: &str) -> Result<Vec<NewsArticle>> {
        let key = CacheKey::new("fetch_news", query);
        let value = self
            .cache
            .get_or_fetch(key, || self.request_articles(query))
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    async fn request_articles(&self, query: &str) -> Result<Value> {
        let params = vec![
            ("q".to_string(), query.to_string()),
            ("apiKey".to_string(), self.api_key.clone()),
            ("pageSize".to_string(), self.page_size.to_string()),
            ("sortBy".to_string(), "publishedAt".to_string()),
            ("language".to_string(), "en".to_string()),
        ];

        let payload = self.transport.get_json(&self.base_url, &params).await?;
        let articles = parse_articles(&payload)?;

        Ok(serde_json::to_value(articles)?)
    }
}

/// Normalize a NewsAPI response body into articles
fn parse_articles(payload: &Value) -> Result<Vec<NewsArticle>> {
    if payload.get("status").and_then(Value::as_str) == Some("error") {
        let reason = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(DelphiError::MalformedPayload {
            provider: PROVIDER,
            reason,
        });
    }

    let Some(articles) = payload.get("articles") else {
        return Ok(Vec::new());
    };

    let articles = articles.as_array().ok_or_else(|| DelphiError::MalformedPayload {
        provider: PROVIDER,
        reason: "`articles` is not a list".to_string(),
    })?;

    Ok(articles.iter().map(parse_article).collect())
}

fn parse_article(article: &Value) -> NewsArticle {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).unwrap_or_default().to_string();

    NewsArticle {
        source: text(article.get("source").and_then(|s| s.get("name"))),
        title: text(article.get("title")),
        content: text(article.get("content")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::MockHttpTransport;
    use serde_json::json;
    use std::time::Duration;

    fn sample_payload() -> Value {
        json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "Reuters"},
                    "title": "Nvidia beats estimates",
                    "content": "Nvidia reported record revenue..."
                },
                {
                    "source": {"id": "bloomberg", "name": "Bloomberg"},
                    "title": "Chip stocks rally",
                    "content": null
                }
            ]
        })
    }

    fn client(transport: MockHttpTransport) -> NewsApiClient {
        NewsApiClient::new(
            Arc::new(transport),
            ApiCache::new(16, Duration::from_secs(60)),
            "test-key",
            "https://newsapi.test/v2/everything",
            5,
        )
    }

    #[test]
    fn test_parse_articles() {
        let articles = parse_articles(&sample_payload()).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source, "Reuters");
        assert_eq!(articles[0].title, "Nvidia beats estimates");
        assert_eq!(articles[1].content, "");
    }

    #[test]
    fn test_parse_error_status() {
        let payload = json!({"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"});
        let err = parse_articles(&payload).unwrap_err();
        assert!(err.to_string().contains("Your API key is invalid"));
    }

    #[tokio::test]
    async fn test_fetch_news_sends_expected_params() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get_json()
            .withf(|url, query| {
                url == "https://newsapi.test/v2/everything"
                    && query.contains(&("q".to_string(), "NVDA".to_string()))
                    && query.contains(&("apiKey".to_string(), "test-key".to_string()))
                    && query.contains(&("pageSize".to_string(), "5".to_string()))
                    && query.contains(&("sortBy".to_string(), "publishedAt".to_string()))
                    && query.contains(&("language".to_string(), "en".to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(sample_payload()));

        let articles = client(transport).fetch_news("NVDA").await;
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_news_is_memoized() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get_json()
            .times(1)
            .returning(|_, _| Ok(sample_payload()));

        let client = client(transport);
        let first = client.fetch_news("NVDA").await;
        let second = client.fetch_news("NVDA").await;

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_returns_empty_list() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get_json().times(2).returning(|url, _| {
            Err(DelphiError::Status {
                url: url.to_string(),
                status: 500,
                body: "internal error".to_string(),
            })
        });

        let client = client(transport);
        assert!(client.fetch_news("NVDA").await.is_empty());
        // failures are not cached, so the second call reaches the transport again
        assert!(client.fetch_news("NVDA").await.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires NEWS_API_KEY and network access"]
    async fn test_live_fetch_news() {
        use crate::api::transport::ReqwestTransport;

        let key = delphi_utils::env_var("NEWS_API_KEY").expect("NEWS_API_KEY not set");
        let client = NewsApiClient::new(
            Arc::new(ReqwestTransport::new(Duration::from_secs(30)).unwrap()),
            ApiCache::default(),
            key,
            crate::config::DEFAULT_NEWS_API_BASE_URL,
            5,
        );

        let articles = client.fetch_news("NVIDIA").await;
        assert!(!articles.is_empty());
    }
}

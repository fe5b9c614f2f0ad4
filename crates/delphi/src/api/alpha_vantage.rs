//! Alpha Vantage API client

use crate::api::transport::HttpTransport;
use crate::cache::{ApiCache, CacheKey};
use crate::error::{DelphiError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{instrument, warn};

const PROVIDER: &str = "alpha_vantage";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

/// Keys Alpha Vantage uses to report errors, throttling, and plan limits
/// inside a 200 response
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Daily closing price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading day, `YYYY-MM-DD`
    pub date: String,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: impl Into<String>, close: f64) -> Self {
        Self {
            date: date.into(),
            close,
        }
    }
}

/// Alpha Vantage client
///
/// Both operations are memoized in the shared [`ApiCache`].
#[derive(Clone)]
pub struct AlphaVantageClient {
    transport: Arc<dyn HttpTransport>,
    cache: ApiCache,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: ApiCache,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cache,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the company overview for `ticker`
    ///
    /// Returns the provider's fields unchanged, or an empty map on any failure.
    pub async fn fetch_company_overview(&self, ticker: &str) -> Map<String, Value> {
        match self.try_fetch_company_overview(ticker).await {
            Ok(overview) => overview,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Company overview fetch failed, returning empty overview");
                Map::new()
            }
        }
    }

    /// Fetch the daily closing prices for `ticker`
    ///
    /// Points come back in the order the provider's payload yields them; sort
    /// before relying on chronology. Returns an empty list on any failure.
    pub async fn fetch_price_history(&self, ticker: &str) -> Vec<PricePoint> {
        match self.try_fetch_price_history(ticker).await {
            Ok(points) => points,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Price history fetch failed, returning no points");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn try_fetch_company_overview(&self, ticker: &str) -> Result<Map<String, Value>> {
        let key = CacheKey::new("fetch_company_overview", ticker);
        let value = self
            .cache
            .get_or_fetch(key, || async {
                let payload = self.query("OVERVIEW", ticker).await?;
                Ok::<_, DelphiError>(Value::Object(parse_overview(payload)?))
            })
            .await?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(malformed(format!("cached overview is not an object: {other}"))),
        }
    }

    #[instrument(skip(self))]
    async fn try_fetch_price_history(&self, ticker: &str) -> Result<Vec<PricePoint>> {
        let key = CacheKey::new("fetch_price_history", ticker);
        let value = self
            .cache
            .get_or_fetch(key, || async {
                let payload = self.query("TIME_SERIES_DAILY", ticker).await?;
                Ok::<_, DelphiError>(serde_json::to_value(parse_daily_series(&payload)?)?)
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    async fn query(&self, function: &str, ticker: &str) -> Result<Value> {
        let params = vec![
            ("function".to_string(), function.to_string()),
            ("symbol".to_string(), ticker.to_string()),
            ("apikey".to_string(), self.api_key.clone()),
        ];

        self.transport.get_json(&self.base_url, &params).await
    }
}

fn malformed(reason: impl Into<String>) -> DelphiError {
    DelphiError::MalformedPayload {
        provider: PROVIDER,
        reason: reason.into(),
    }
}

fn check_notice(payload: &Map<String, Value>) -> Result<()> {
    for key in NOTICE_KEYS {
        if let Some(notice) = payload.get(key) {
            return Err(malformed(format!("{key}: {notice}")));
        }
    }
    Ok(())
}

/// Validate an OVERVIEW payload and pass its fields through
fn parse_overview(payload: Value) -> Result<Map<String, Value>> {
    let Value::Object(map) = payload else {
        return Err(malformed("overview is not an object"));
    };

    check_notice(&map)?;

    if map.is_empty() {
        return Err(malformed("no overview data for ticker"));
    }

    Ok(map)
}

/// Extract `{date, close}` points from a TIME_SERIES_DAILY payload
fn parse_daily_series(payload: &Value) -> Result<Vec<PricePoint>> {
    let map = payload
        .as_object()
        .ok_or_else(|| malformed("time series payload is not an object"))?;

    check_notice(map)?;

    let series = map
        .get(DAILY_SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing daily time series"))?;

    series
        .iter()
        .map(|(date, bar)| {
            let close = bar
                .get("4. close")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| malformed(format!("missing close price for {date}")))?;
            Ok(PricePoint::new(date.clone(), close))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::MockHttpTransport;
    use serde_json::json;
    use std::time::Duration;

    fn overview_payload() -> Value {
        json!({
            "Symbol": "NVDA",
            "Name": "NVIDIA Corporation",
            "Sector": "TECHNOLOGY",
            "MarketCapitalization": "3000000000000",
            "PERatio": "65.2"
        })
    }

    fn daily_payload() -> Value {
        json!({
            "Meta Data": {"2. Symbol": "NVDA"},
            "Time Series (Daily)": {
                "2024-01-02": {"1. open": "99.0", "4. close": "100.5", "5. volume": "1000"},
                "2024-01-01": {"1. open": "89.0", "4. close": "90.25", "5. volume": "900"}
            }
        })
    }

    fn client(transport: MockHttpTransport) -> AlphaVantageClient {
        AlphaVantageClient::new(
            Arc::new(transport),
            ApiCache::new(16, Duration::from_secs(60)),
            "test-key",
            "https://alphavantage.test/query",
        )
    }

    #[test]
    fn test_parse_overview_rejects_notices() {
        assert!(parse_overview(overview_payload()).is_ok());
        assert!(parse_overview(json!({})).is_err());
        assert!(parse_overview(json!({"Note": "Thank you for using Alpha Vantage!"})).is_err());
        assert!(parse_overview(json!({"Error Message": "Invalid API call."})).is_err());
        assert!(parse_overview(json!({"Information": "premium endpoint"})).is_err());
        assert!(parse_overview(json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_daily_series() {
        let mut points = parse_daily_series(&daily_payload()).unwrap();
        points.sort_by(|a, b| a.date.cmp(&b.date));

        assert_eq!(
            points,
            vec![
                PricePoint::new("2024-01-01", 90.25),
                PricePoint::new("2024-01-02", 100.5),
            ]
        );

        assert!(parse_daily_series(&json!({"Meta Data": {}})).is_err());
    }

    #[tokio::test]
    async fn test_fetch_company_overview_is_memoized() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get_json()
            .withf(|_, query| {
                query.contains(&("function".to_string(), "OVERVIEW".to_string()))
                    && query.contains(&("symbol".to_string(), "NVDA".to_string()))
                    && query.contains(&("apikey".to_string(), "test-key".to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(overview_payload()));

        let client = client(transport);
        let first = client.fetch_company_overview("NVDA").await;
        let second = client.fetch_company_overview("NVDA").await;

        assert_eq!(first, second);
        assert_eq!(first.get("Name"), Some(&json!("NVIDIA Corporation")));
    }

    #[tokio::test]
    async fn test_non_success_status_returns_empty_overview() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get_json().times(1).returning(|url, _| {
            Err(DelphiError::Status {
                url: url.to_string(),
                status: 503,
                body: String::new(),
            })
        });

        assert!(client(transport).fetch_company_overview("NVDA").await.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_note_returns_empty_overview() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get_json()
            .times(1)
            .returning(|_, _| Ok(json!({"Note": "API call frequency exceeded"})));

        assert!(client(transport).fetch_company_overview("NVDA").await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_price_history() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get_json()
            .withf(|_, query| query.contains(&("function".to_string(), "TIME_SERIES_DAILY".to_string())))
            .times(1)
            .returning(|_, _| Ok(daily_payload()));

        let client = client(transport);
        let points = client.fetch_price_history("NVDA").await;
        assert_eq!(points.len(), 2);

        // served from cache
        assert_eq!(client.fetch_price_history("NVDA").await, points);
    }

    #[tokio::test]
    async fn test_overview_and_history_use_distinct_cache_keys() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get_json().times(2).returning(|_, query| {
            if query.contains(&("function".to_string(), "OVERVIEW".to_string())) {
                Ok(overview_payload())
            } else {
                Ok(daily_payload())
            }
        });

        let client = client(transport);
        assert!(!client.fetch_company_overview("NVDA").await.is_empty());
        assert!(!client.fetch_price_history("NVDA").await.is_empty());
    }
}

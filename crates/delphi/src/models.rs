//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input of one research run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub ticker: String,
    pub query: String,
}

impl ResearchQuery {
    pub fn new(ticker: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            query: query.into(),
        }
    }
}

/// Body of `POST /research`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    /// Stock ticker symbol of the company to research, e.g. `NVDA`
    pub ticker: String,
    /// High-level research question or topic
    pub query: String,
}

impl From<ResearchRequest> for ResearchQuery {
    fn from(request: ResearchRequest) -> Self {
        Self {
            ticker: request.ticker,
            query: request.query,
        }
    }
}

/// Acknowledgement returned when a research task is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: String,
}

impl TaskResponse {
    /// Acknowledgement for a freshly scheduled task
    pub fn pending(task_id: Uuid) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: "PENDING".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_into_query() {
        let request: ResearchRequest =
            serde_json::from_value(json!({"ticker": "NVDA", "query": "AI chips"})).unwrap();
        assert_eq!(ResearchQuery::from(request), ResearchQuery::new("NVDA", "AI chips"));
    }

    #[test]
    fn test_pending_response() {
        let id = Uuid::new_v4();
        let response = TaskResponse::pending(id);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"task_id": id.to_string(), "status": "PENDING"})
        );
    }
}

//! In-memory task-status store
//!
//! Records live only as long as the process. A record is dropped once it has
//! gone unchanged for the retention period, or when the store is full and it
//! is the least recently used one.

use crate::models::ResearchQuery;
use cached::{Cached, TimedSizedCache};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lifecycle of a research task: `PENDING -> RUNNING -> COMPLETED | FAILED`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of one research task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub ticker: String,
    pub query: String,
    /// Research bundle gathered by the researcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<Value>,
    /// Markdown report written by the analyst
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Base64-encoded price chart; empty when no price history was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared, bounded task store; clones see the same records
///
/// Every status change restarts a record's retention period.
#[derive(Clone)]
pub struct TaskStore {
    tasks: Arc<RwLock<TimedSizedCache<Uuid, TaskRecord>>>,
}

impl TaskStore {
    /// Keep at most `max_entries` records, each for `retention` after its last update
    pub fn new(max_entries: usize, retention: Duration) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(TimedSizedCache::with_size_and_lifespan(
                max_entries.max(1),
                retention,
            ))),
        }
    }

    /// Register a new task in `PENDING`
    pub async fn create(&self, task_id: Uuid, query: &ResearchQuery) -> TaskRecord {
        let now = Utc::now();
        let record = TaskRecord {
            task_id,
            status: TaskStatus::Pending,
            ticker: query.ticker.clone(),
            query: query.query.clone(),
            research: None,
            report: None,
            chart: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        let _ = self.tasks.write().await.cache_set(task_id, record.clone());
        record
    }

    /// Current snapshot of a task; `None` if unknown or already evicted
    pub async fn get(&self, task_id: Uuid) -> Option<TaskRecord> {
        // expiry and recency bookkeeping need the write half
        self.tasks.write().await.cache_get(&task_id).cloned()
    }

    pub async fn mark_running(&self, task_id: Uuid) {
        self.update(task_id, |record| record.status = TaskStatus::Running)
            .await;
    }

    /// Store the workflow's outputs and mark the task `COMPLETED`
    pub async fn complete(&self, task_id: Uuid, research: Value, report: String, chart: String) {
        self.update(task_id, |record| {
            record.status = TaskStatus::Completed;
            record.research = Some(research);
            record.report = Some(report);
            record.chart = Some(chart);
        })
        .await;
    }

    pub async fn fail(&self, task_id: Uuid, error: impl Into<String>) {
        let error = error.into();
        self.update(task_id, |record| {
            record.status = TaskStatus::Failed;
            record.error = Some(error);
        })
        .await;
    }

    /// Apply `change` unless the task is unknown or already terminal
    async fn update(&self, task_id: Uuid, change: impl FnOnce(&mut TaskRecord)) {
        let mut tasks = self.tasks.write().await;
        let Some(mut record) = tasks.cache_get(&task_id).cloned() else {
            tracing::warn!(task_id = %task_id, "Status update for unknown or evicted task");
            return;
        };

        if record.status.is_terminal() {
            tracing::warn!(task_id = %task_id, status = ?record.status, "Ignoring update to finished task");
            return;
        }

        change(&mut record);
        record.updated_at = Utc::now();
        // re-inserting restarts the retention period
        let _ = tasks.cache_set(task_id, record);
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(1024, Duration::from_secs(3600))
    }
}

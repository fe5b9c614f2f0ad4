//! Automated financial research service
//!
//! Delphi answers a `(ticker, query)` pair in three steps:
//!
//! - A researcher asks a chat model which data tools to call (recent news,
//!   company overview), runs the selected tools concurrently, and gathers the
//!   results into a [`agents::ResearchBundle`]
//! - An analyst turns the bundle into a Markdown investment summary
//! - A chartist renders the daily closing-price history as a base64 image
//!
//! Provider responses are memoized in a bounded, time-limited [`cache::ApiCache`].
//! Every stage fails closed: missing credentials, HTTP failures, and
//! malformed payloads become empty values plus a log line, never an error
//! for the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use delphi::config::DelphiConfig;
//! use delphi::models::ResearchQuery;
//! use delphi::workflow::ResearchWorkflow;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DelphiConfig::from_env()?;
//!     let workflow = ResearchWorkflow::from_config(&config)?;
//!
//!     let ack = workflow
//!         .submit(ResearchQuery::new("NVDA", "How is NVIDIA positioned in AI chips?"))
//!         .await;
//!     println!("scheduled {}", ack.task_id);
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;
pub mod tasks;
pub mod tools;
pub mod workflow;

pub use config::DelphiConfig;
pub use error::{DelphiError, Result};
pub use models::{ResearchQuery, ResearchRequest, TaskResponse};
pub use workflow::ResearchWorkflow;

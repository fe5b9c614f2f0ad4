//! Shared utilities for Delphi
//!
//! Logging setup and environment-variable helpers used by the service crate
//! and its binary.

pub mod config;
pub mod logging;

pub use config::{EnvError, env_or, env_parse, env_var, load_dotenv};
pub use logging::init_tracing;

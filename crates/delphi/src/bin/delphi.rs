//! Delphi research API server
//!
//! # Usage
//!
//! ```bash
//! # Credentials (any missing one disables its component)
//! export MISTRAL_API_KEY="..."
//! export NEWS_API_KEY="..."
//! export ALPHA_VANTAGE_API_KEY="..."
//!
//! cargo run --bin delphi -- --port 8000
//! ```

use clap::Parser;
use delphi::config::DelphiConfig;
use delphi::server::{self, ApiState};
use delphi::workflow::ResearchWorkflow;
use tracing::info;

/// Multi-agent automated financial research API
#[derive(Debug, Parser)]
#[command(name = "delphi", version, about)]
struct Args {
    /// Interface to bind (overrides DELPHI_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides DELPHI_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let dotenv_loaded = delphi_utils::load_dotenv();
    delphi_utils::init_tracing("info,delphi=debug,tower_http=info");
    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    let mut config = DelphiConfig::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let addr = config.bind_addr()?;
    let workflow = ResearchWorkflow::from_config(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        researcher = config.mistral_api_key.is_some(),
        news = config.news_api_key.is_some(),
        financials = config.alpha_vantage_api_key.is_some(),
        "Starting Delphi"
    );

    server::serve(ApiState::new(workflow), addr).await?;

    Ok(())
}

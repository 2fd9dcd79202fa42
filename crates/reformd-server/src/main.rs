//! Re:Formd Server — Application entry point.

use reformd_server::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reformd=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Re:Formd waitlist server...");

    reformd_server::start_server(Config::load()).await
}

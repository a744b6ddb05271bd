//! cli entrypoint for awxstate.

mod app;

use anyhow::Result;
use clap::Parser;

/// main entrypoint for the async cli.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "awxstate=info".into()),
        )
        .init();

    app::run(app::Cli::parse()).await
}

//! Lydtrekk service entry point.

use anyhow::Result;
use clap::Parser;
use lydtrekk::config::Settings;
use lydtrekk::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    // Initialize logging
    let log_level = match settings.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lydtrekk={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    server::run_serve(settings).await
}

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tollgate::probe::Probe;
use tollgate::signal::shutdown_signal;

/// Poll a rate limited endpoint and log the reset time it reports.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// URL to request from
    #[arg(long, default_value = "http://localhost:8080/")]
    url: String,

    /// Seconds between requests
    #[arg(long, default_value_t = 1)]
    every_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let probe = Probe::new(args.url, Duration::from_secs(args.every_secs))?;
    probe.run(shutdown_signal()).await?;
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollgate::config::TollgateConfig;
use tollgate::signal::shutdown_signal;
use tollgate::web::HttpServer;

/// Serve `GET /` behind a fixed-window rate limiter.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port at which the server listens for requests
    #[arg(long)]
    port: Option<u16>,

    /// Maximum number of requests per interval
    #[arg(long)]
    max: Option<u64>,

    /// Window length in seconds
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Tollgate");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = TollgateConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.listen_addr = SocketAddr::new(config.server.listen_addr.ip(), port);
    }
    if let Some(max) = args.max {
        config.rate_limiting.limit = max;
    }
    if let Some(secs) = args.interval_secs {
        config.rate_limiting.interval_secs = secs;
    }
    info!(listen_addr = %config.server.listen_addr, "Configuration loaded");

    let rate_limiter = Arc::new(config.rate_limiting.build_limiter()?);
    info!(
        "Exposing / on {} with rate limit of {} per {:?}",
        config.server.listen_addr,
        config.rate_limiting.limit,
        config.rate_limiting.interval()
    );

    HttpServer::new(config.server.listen_addr, rate_limiter)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    info!("Tollgate stopped");
    Ok(())
}

// autoskip - skip to the next track after a fixed listening interval

use anyhow::{Context, Result};
use autoskip::{config::Config, Monitor, SkipInterval};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "autoskip")]
#[command(about = "Skips to the next track after you've listened for a fixed interval")]
struct Args {
    /// Seconds to listen before skipping (overrides the config file)
    #[arg(short, long)]
    interval: Option<String>,

    /// Playback poll period in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,
}

fn init_logging(dev: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autoskip")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&log_dir, "autoskip.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,autoskip=debug"));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    // In dev mode, also log to stderr
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(base_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    config.apply_env();

    if let Some(raw) = &args.interval {
        let interval = SkipInterval::parse(raw)?;
        config.skip_interval_secs = Some(interval.as_duration().as_secs());
    }
    if let Some(poll_ms) = args.poll_ms {
        config.poll_interval_ms = poll_ms;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(args.dev)?;

    info!("autoskip starting up");

    // Anything wrong here is fatal, the loop never starts. The error is
    // reported once, when main returns it.
    let config = load_config(&args)?;
    let settings = config.validate()?;
    let client = autoskip::spotify::SpotifyClient::new(&config.spotify)?;

    println!("Skipping every {} (Ctrl-C to stop)", settings.skip_interval);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    cancel.cancel();
                }
                Err(e) => error!("Could not listen for Ctrl-C: {}", e),
            }
        });
    }

    let report = Monitor::new(Arc::new(client), settings).run(cancel).await?;

    println!(
        "Skipped {} tracks ({} failed) over {} polls",
        report.skips_fired - report.skip_failures,
        report.skip_failures,
        report.polls
    );

    Ok(())
}

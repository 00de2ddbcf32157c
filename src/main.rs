use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use wallet_risk_engine::api::{self, AppState};
use wallet_risk_engine::config::Config;
use wallet_risk_engine::feed::etherscan::EtherscanFeed;
use wallet_risk_engine::feed::file::JsonFileFeed;
use wallet_risk_engine::feed::TransactionFeed;
use wallet_risk_engine::monitor::Monitor;
use wallet_risk_engine::pipeline::{normalize_address, RiskPipeline};

enum Mode {
    Analyze(String),
    Monitor(String),
    Serve,
}

fn parse_mode(args: &[String]) -> eyre::Result<Mode> {
    match (args.get(2), args.get(3).map(|s| s.as_str())) {
        (None, _) => Ok(Mode::Serve),
        (Some(address), None) => Ok(Mode::Analyze(normalize_address(address)?)),
        (Some(address), Some("monitor")) => Ok(Mode::Monitor(normalize_address(address)?)),
        (Some(_), Some(other)) => Err(eyre::eyre!(
            "Unknown mode '{}'. Usage: wallet-risk [config.toml] [address] [monitor]",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    // Structured logging on stderr so analysis output stays clean (RUST_LOG=info)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!("Configuration loaded from {}", config_path);

    let mode = parse_mode(&args)?;
    let pipeline = RiskPipeline::init(&config);
    tracing::info!(
        knowledge_base_entries = pipeline.knowledge_base().len(),
        "Risk pipeline initialized"
    );

    match &config.feed.source_file {
        Some(path) => {
            tracing::info!(path = %path, "Reading transactions from file");
            run(&config, pipeline, JsonFileFeed::new(path), mode).await
        }
        None => {
            let feed = EtherscanFeed::new(&config.feed)?;
            run(&config, pipeline, feed, mode).await
        }
    }
}

async fn run<F: TransactionFeed + 'static>(
    config: &Config,
    pipeline: RiskPipeline,
    feed: F,
    mode: Mode,
) -> eyre::Result<()> {
    let fetch_timeout = Duration::from_secs(config.feed.timeout_secs);

    match mode {
        Mode::Analyze(address) => {
            let result = pipeline
                .analyze_address(&feed, &address, fetch_timeout)
                .await
                .map_err(|e| eyre::eyre!("Analysis of {} failed: {}", address, e))?;
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| eyre::eyre!("Failed to serialize result: {}", e))?;
            println!("{}", json);
        }
        Mode::Monitor(address) => {
            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                tracing::info!("Shutdown signal received, stopping monitor...");
                signal.cancel();
            });

            let mut monitor = Monitor::new(&address, feed, pipeline, &config.monitor, fetch_timeout);
            let summary = monitor.run(shutdown).await;
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| eyre::eyre!("Failed to serialize summary: {}", e))?;
            println!("{}", json);
        }
        Mode::Serve => {
            if !config.api.enabled {
                tracing::warn!("API disabled and no address given, nothing to do");
                return Ok(());
            }
            let state = AppState {
                pipeline,
                feed,
                fetch_timeout,
            };
            tokio::select! {
                result = api::serve(state, &config.api.host, config.api.port) => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping API server");
                }
            }
        }
    }

    Ok(())
}

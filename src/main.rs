// src/main.rs
use crate::config::{AppConfig, Overrides};
use crate::connectors::binance::BinanceClient;
use crate::connectors::paper::PaperExchange;
use crate::connectors::traits::ExchangeGateway;
use crate::core::engine::TslEngine;
use clap::Parser;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod config;
mod connectors;
mod core;
mod error;
mod reporter;
mod strategies;
mod types;
mod utils;

/// Keeps a rising stop-loss sell order under the whole balance of one asset.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file (toml/yaml/json, extension optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Held asset, e.g. BTC
    #[arg(short, long)]
    asset: Option<String>,

    /// Seconds between price polls
    #[arg(short, long)]
    wait: Option<u64>,

    /// Number of prices in the rolling window
    #[arg(long)]
    window: Option<u64>,

    /// Trailing margin as a fraction, e.g. 0.05
    #[arg(short, long)]
    percent: Option<f64>,

    /// Place real orders instead of paper ones
    #[arg(long)]
    live: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            settings_file: self.config.clone(),
            asset: self.asset.clone(),
            wait_interval_secs: self.wait,
            window_size: self.window,
            trailing_percent: self.percent,
            live_trading: self.live.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.overrides())?;
    let _log_guard = utils::logging::init_logging(&config.log_file)?;
    let settings = config.engine_settings()?;

    info!("========================================");
    info!("       TSL GUARD - v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!(
        "Target: {} | trailing {}% | every {}s | window {}",
        settings.symbol,
        settings.trailing_percent * rust_decimal::Decimal::ONE_HUNDRED,
        config.wait_interval_secs,
        config.window_size
    );
    info!(
        "Mode:   {}",
        if config.live_trading {
            "LIVE TRADING"
        } else {
            "PAPER TRADING"
        }
    );

    // 2. Initialize Components
    let binance = Arc::new(BinanceClient::new(
        config.api_key.clone(),
        config.secret_key.clone(),
        &config.base_url,
        Duration::from_secs(config.http_timeout_secs),
    )?);
    let gateway: Arc<dyn ExchangeGateway> = if config.live_trading {
        binance as Arc<dyn ExchangeGateway>
    } else {
        Arc::new(PaperExchange::new(
            binance,
            &settings.asset,
            config.paper_balance,
        ))
    };

    let (event_tx, event_rx) = mpsc::channel(100);
    let reporter = tokio::spawn(reporter::run(event_rx));

    // 3. Run Engine
    let mut engine = TslEngine::new(settings, gateway, event_tx);
    let result = tokio::select! {
        result = engine.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let last_stop = engine.stop_price();
    drop(engine);
    let _ = reporter.await;

    match result {
        Some(Ok(report)) => {
            info!(
                "Sell executed: {} {} for {}",
                report.filled_size, report.symbol, report.executed_value
            );
            if let Some(avg) = report.average_price() {
                info!("Average fill price: {:.2}", avg);
            }
            Ok(())
        }
        Some(Err(e)) => {
            error!("Fatal Engine Error: {}", e);
            Err(e.into())
        }
        None => {
            warn!(
                "Interrupted; the protective order at stop {:.2} stays on the exchange",
                last_stop
            );
            Ok(())
        }
    }
}

// src/main.rs
use crate::config::{AppConfig, LogConfig};
use crate::connectors::telegram::notifier_from_env;
use crate::connectors::yahoo::YahooClient;
use crate::core::engine::{EngineControls, TradingEngine};
use crate::storage::{restore_account, JsonStateStore, StateStore};
use crate::strategies::build_strategy;
use crate::tui::{App, Dashboard};
use crate::utils::precision::usd;
use anyhow::anyhow;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;

mod config;
mod connectors;
mod core;
mod error;
mod indicators;
mod storage;
mod strategies;
#[cfg(test)]
mod test_support;
mod tui;
mod types;
mod utils;

fn init_logging(log: &LogConfig) -> anyhow::Result<WorkerGuard> {
    let level = log.level.parse::<Level>().unwrap_or(Level::INFO);
    let appender = tracing_appender::rolling::daily(&log.dir, "paper_trader.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| anyhow!(e))?;
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new()?;
    let _log_guard = init_logging(&config.log)?;
    let strategy = build_strategy(&config.strategy);
    let strategy_name = strategy.name();

    println!("========================================");
    println!("       PAPER TRADER - v0.1.0");
    println!("========================================");
    println!("Tickers:  {}", config.tickers.join(", "));
    println!("Strategy: {}", strategy_name);
    println!(
        "Risk:     x{} leverage, {} per trade, +{} / -{} net",
        config.leverage, config.allocation_pct, config.target_net_profit, config.stop_loss_pct
    );
    println!("Logs:     {}/", config.log.dir);
    println!("========================================");

    // 2. Initialize Components
    let state_store = JsonStateStore::new(&config.state_file);
    info!("State file: {}", state_store.path().display());
    let store: Arc<dyn StateStore> = Arc::new(state_store);
    let account = restore_account(store.as_ref(), config.initial_capital, &config.tickers).await;
    let provider = YahooClient::new(&config.data)?;
    let notifier = notifier_from_env();

    // 3. Create Channels
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (enabled_tx, enabled_rx) = watch::channel(true);
    let (ui_tx, ui_rx) = if config.ui.enabled {
        let (tx, rx) = mpsc::channel(100);
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    // 4. Run Engine
    let mut engine = TradingEngine::new(
        config.clone(),
        account,
        Box::new(provider),
        notifier,
        store.clone(),
        strategy,
        ui_tx,
        EngineControls {
            trading_enabled: enabled_rx,
            shutdown: shutdown_rx,
        },
    );
    let engine_task = tokio::spawn(async move {
        let result = engine.run().await;
        info!(
            "Final equity {}, {} open positions",
            usd(engine.account().equity),
            engine.account().open_positions()
        );
        result
    });

    // 5. Dashboard or headless wait
    match ui_rx {
        Some(rx) => {
            let app = App::new(strategy_name.to_string(), config.tickers.clone());
            let dashboard = Dashboard {
                rx,
                store,
                trading_enabled: enabled_tx,
                refresh: Duration::from_secs(config.ui.refresh_secs),
            };
            if let Err(e) = tui::run(dashboard, app).await {
                eprintln!("Dashboard error: {}", e);
            }
        }
        None => {
            println!("Headless mode, press Ctrl+C to stop.");
            let _enabled = enabled_tx;
            tokio::signal::ctrl_c().await?;
        }
    }

    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
    if let Err(e) = engine_task.await? {
        eprintln!("Fatal Engine Error: {}", e);
    }

    Ok(())
}

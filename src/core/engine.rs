// src/core/engine.rs
use crate::config::AppConfig;
use crate::connectors::traits::{MarketDataProvider, Notifier};
use crate::core::evaluator::{evaluate, CycleOutcome};
use crate::core::ledger::Account;
use crate::storage::StateStore;
use crate::strategies::traits::EntryStrategy;
use crate::types::{LedgerEvent, UiEvent};
use crate::utils::precision::usd;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Operator switches the engine listens to.
pub struct EngineControls {
    pub trading_enabled: watch::Receiver<bool>,
    pub shutdown: watch::Receiver<bool>,
}

pub struct TradingEngine {
    config: AppConfig,
    account: Account,
    provider: Box<dyn MarketDataProvider>,
    notifier: Box<dyn Notifier>,
    store: Arc<dyn StateStore>,
    strategy: Box<dyn EntryStrategy>,
    ui_sender: Option<mpsc::Sender<UiEvent>>,
    controls: EngineControls,
}

impl TradingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        account: Account,
        provider: Box<dyn MarketDataProvider>,
        notifier: Box<dyn Notifier>,
        store: Arc<dyn StateStore>,
        strategy: Box<dyn EntryStrategy>,
        ui_sender: Option<mpsc::Sender<UiEvent>>,
        controls: EngineControls,
    ) -> Self {
        Self {
            config,
            account,
            provider,
            notifier,
            store,
            strategy,
            ui_sender,
            controls,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    async fn save_state(&self) {
        match self.store.save(&self.account).await {
            Ok(()) => info!("💾 State saved"),
            Err(e) => error!("Failed to save bot state: {}", e),
        }
    }

    fn send_ui_event(&self, event: UiEvent) {
        let Some(sender) = &self.ui_sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("UI Channel closed! Interface is likely dead.");
            }
        }
    }

    async fn announce(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Opened {
                ticker,
                price,
                invested,
            } => info!("📈 Opened {} @ {} with {}", ticker, price, usd(*invested)),
            LedgerEvent::Closed(record) => info!(
                "📉 Closed {} {:?}: net {} ({})",
                record.ticker, record.outcome, record.net_pnl, record.net_pnl_pct
            ),
        }

        if let Err(e) = self.notifier.notify(&event.describe()).await {
            warn!("Notification failed: {}", e);
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Engine starting. Strategy: {}, tickers: {}",
            self.strategy.name(),
            self.config.tickers.join(",")
        );

        let mut timer =
            tokio::time::interval(Duration::from_secs(self.config.decision_interval_secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                _ = self.controls.shutdown.changed() => {
                    info!("Engine stopping");
                    break;
                }
            }
        }
        Ok(())
    }

    /// One fetch / evaluate / persist pass. Data failures skip the cycle.
    pub async fn run_cycle(&mut self) -> Option<CycleOutcome> {
        let snapshot = match self
            .provider
            .fetch_snapshot(&self.config.tickers, self.strategy.min_candles())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if e.is_retryable() {
                    warn!("Cycle skipped, retrying next tick: {}", e);
                } else {
                    error!("Cycle skipped: {}", e);
                }
                self.send_ui_event(UiEvent::Log(format!("Data unavailable: {e}")));
                return None;
            }
        };

        if snapshot.is_empty() {
            warn!("No ticker had usable data this cycle");
        } else {
            debug!("Fetched {}/{} tickers", snapshot.len(), self.config.tickers.len());
        }

        let trading_enabled = *self.controls.trading_enabled.borrow();
        let outcome = evaluate(
            &mut self.account,
            &snapshot,
            &self.config.tickers,
            self.strategy.as_ref(),
            &self.config.risk(),
            trading_enabled,
            Utc::now(),
        );

        for event in &outcome.events {
            self.announce(event).await;
        }
        if outcome.changed() {
            self.save_state().await;
        }

        self.send_ui_event(UiEvent::Marks(outcome.marks.clone()));
        for event in &outcome.events {
            self.send_ui_event(UiEvent::Ledger(event.clone()));
        }

        info!(
            "Cycle done: equity {}, cash {}, open {}/{}{}",
            usd(self.account.equity),
            usd(self.account.balance),
            self.account.open_positions(),
            self.config.tickers.len(),
            if trading_enabled { "" } else { " (entries paused)" }
        );
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataError, NotifyError, StoreError};
    use crate::strategies::build_strategy;
    use crate::test_support::{bearish_pair, bullish_pair, dec, strategy_config, tickers};
    use crate::types::MarketSnapshot;
    use async_trait::async_trait;
    use config::Config;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProvider {
        cycles: Mutex<VecDeque<Result<MarketSnapshot, DataError>>>,
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedProvider {
        async fn fetch_snapshot(
            &self,
            _tickers: &[String],
            _min_candles: usize,
        ) -> Result<MarketSnapshot, DataError> {
            self.cycles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(MarketSnapshot::new()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(NotifyError::Rejected("bot was blocked by the user".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<Account>>,
        fail: bool,
    }

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn load(&self) -> Result<Option<Account>, StoreError> {
            Ok(self.saved.lock().unwrap().last().cloned())
        }

        async fn save(&self, account: &Account) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.saved.lock().unwrap().push(account.clone());
            Ok(())
        }
    }

    struct Harness {
        engine: TradingEngine,
        notifier: RecordingNotifier,
        store: Arc<MemoryStore>,
        enabled: watch::Sender<bool>,
        _shutdown: watch::Sender<bool>,
    }

    fn app_config() -> AppConfig {
        let mut config: AppConfig = AppConfig::with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        config.tickers = tickers();
        config
    }

    fn harness(
        cycles: Vec<Result<MarketSnapshot, DataError>>,
        notifier: RecordingNotifier,
        store: MemoryStore,
    ) -> Harness {
        let store = Arc::new(store);
        let (enabled, trading_enabled) = watch::channel(true);
        let (shutdown_tx, shutdown) = watch::channel(false);
        let engine = TradingEngine::new(
            app_config(),
            Account::new(dec("10000"), &tickers()),
            Box::new(ScriptedProvider {
                cycles: Mutex::new(cycles.into()),
            }),
            Box::new(notifier.clone()),
            store.clone(),
            build_strategy(&strategy_config()),
            None,
            EngineControls {
                trading_enabled,
                shutdown,
            },
        );
        Harness {
            engine,
            notifier,
            store,
            enabled,
            _shutdown: shutdown_tx,
        }
    }

    fn snapshot(ticker: &str, candles: Vec<crate::types::Candle>) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::new();
        snapshot.insert(ticker, candles);
        snapshot
    }

    #[tokio::test]
    async fn entry_then_exit_notifies_and_persists() {
        let mut h = harness(
            vec![
                Ok(snapshot("NVDA", bullish_pair(100.0))),
                Ok(snapshot("NVDA", bearish_pair(100.85))),
            ],
            RecordingNotifier::default(),
            MemoryStore::default(),
        );

        h.engine.run_cycle().await.unwrap();
        h.engine.run_cycle().await.unwrap();

        let sent = h.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].starts_with("🚀 ENTRY: NVDA"));
        assert!(sent[1].starts_with("✅ WIN: NVDA"));

        let saved = h.store.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1], *h.engine.account());
        assert_eq!(saved[1].wins, 1);
    }

    #[tokio::test]
    async fn quiet_cycle_writes_nothing() {
        let mut h = harness(
            vec![Ok(snapshot("NVDA", bearish_pair(100.0)))],
            RecordingNotifier::default(),
            MemoryStore::default(),
        );
        let before = h.engine.account().clone();

        let outcome = h.engine.run_cycle().await.unwrap();

        assert!(!outcome.changed());
        assert_eq!(*h.engine.account(), before);
        assert!(h.notifier.sent.lock().unwrap().is_empty());
        assert!(h.store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_skips_cycle() {
        let mut h = harness(
            vec![Err(DataError::Unavailable)],
            RecordingNotifier::default(),
            MemoryStore::default(),
        );
        let before = h.engine.account().clone();

        assert!(h.engine.run_cycle().await.is_none());
        assert_eq!(*h.engine.account(), before);
    }

    #[tokio::test]
    async fn save_failure_keeps_memory_state() {
        let mut h = harness(
            vec![Ok(snapshot("NVDA", bullish_pair(100.0)))],
            RecordingNotifier::default(),
            MemoryStore {
                fail: true,
                ..Default::default()
            },
        );

        h.engine.run_cycle().await.unwrap();

        assert_eq!(h.engine.account().open_positions(), 1);
        assert_eq!(h.engine.account().balance, dec("9000"));
    }

    #[tokio::test]
    async fn notification_failure_is_ignored() {
        let mut h = harness(
            vec![Ok(snapshot("NVDA", bullish_pair(100.0)))],
            RecordingNotifier {
                fail: true,
                ..Default::default()
            },
            MemoryStore::default(),
        );

        let outcome = h.engine.run_cycle().await.unwrap();

        assert!(outcome.changed());
        assert_eq!(h.store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn paused_trading_blocks_entries() {
        let mut h = harness(
            vec![Ok(snapshot("NVDA", bullish_pair(100.0)))],
            RecordingNotifier::default(),
            MemoryStore::default(),
        );
        h.enabled.send(false).unwrap();

        let outcome = h.engine.run_cycle().await.unwrap();

        assert!(!outcome.changed());
        assert_eq!(h.engine.account().open_positions(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let (_enabled, trading_enabled) = watch::channel(true);
        let mut engine = TradingEngine::new(
            app_config(),
            Account::new(dec("10000"), &tickers()),
            Box::new(ScriptedProvider {
                cycles: Mutex::new(VecDeque::new()),
            }),
            Box::new(RecordingNotifier::default()),
            Arc::new(MemoryStore::default()),
            build_strategy(&strategy_config()),
            None,
            EngineControls {
                trading_enabled,
                shutdown,
            },
        );

        let task = tokio::spawn(async move { engine.run().await });
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}

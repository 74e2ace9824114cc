// src/core/ledger.rs
use crate::config::RiskParams;
use crate::types::{LedgerEvent, Position, PositionStatus, TradeOutcome, TradeRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Closed trades kept in the account history.
pub const HISTORY_LIMIT: usize = 50;

/// Mark-to-market of one leveraged position, commission included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlBreakdown {
    pub gross_value: Decimal,
    pub leveraged_invested: Decimal,
    pub gross_pnl: Decimal,
    pub commission: Decimal,
    pub net_pnl: Decimal,
    pub net_pnl_pct: Decimal,
}

impl PnlBreakdown {
    /// Requires `position.is_valuable()`.
    pub fn compute(position: &Position, current_price: Decimal, risk: &RiskParams) -> Self {
        let leveraged_invested = position.invested * risk.leverage;
        let gross_value = leveraged_invested / position.entry_price * current_price;
        let gross_pnl = gross_value - leveraged_invested;
        let commission = leveraged_invested * risk.commission_rate;
        let net_pnl = gross_pnl - commission;
        let net_pnl_pct = net_pnl / position.invested;

        Self {
            gross_value,
            leveraged_invested,
            gross_pnl,
            commission,
            net_pnl,
            net_pnl_pct,
        }
    }

    /// Target is checked before the stop.
    pub fn exit_outcome(&self, risk: &RiskParams) -> Option<TradeOutcome> {
        if self.net_pnl_pct >= risk.target_net_profit {
            Some(TradeOutcome::Win)
        } else if self.net_pnl_pct <= -risk.stop_loss_pct {
            Some(TradeOutcome::Loss)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Decimal,
    pub equity: Decimal,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub portfolio: BTreeMap<String, Position>,
    #[serde(default)]
    pub history: Vec<TradeRecord>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(initial_capital: Decimal, tickers: &[String]) -> Self {
        let mut account = Self {
            balance: initial_capital,
            equity: initial_capital,
            wins: 0,
            losses: 0,
            portfolio: BTreeMap::new(),
            history: Vec::new(),
            last_update: None,
        };
        account.reconcile(tickers);
        account
    }

    /// Ensures every configured ticker has a slot and trims history.
    pub fn reconcile(&mut self, tickers: &[String]) {
        for ticker in tickers {
            self.portfolio.entry(ticker.clone()).or_default();
        }
        self.truncate_history();
    }

    /// Rejects snapshots that could not have been produced by the ledger.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.balance < Decimal::ZERO {
            return Err(format!("negative balance {}", self.balance));
        }
        match self.portfolio.iter().find(|(_, p)| !p.is_valuable()) {
            Some((ticker, p)) => Err(format!(
                "{} invested with entry price {} and margin {}",
                ticker, p.entry_price, p.invested
            )),
            None => Ok(()),
        }
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.portfolio.get(ticker)
    }

    pub fn open_positions(&self) -> usize {
        self.portfolio.values().filter(|p| p.is_invested()).count()
    }

    /// Win rate in percent, 0 when no trade has closed yet.
    pub fn win_rate(&self) -> f64 {
        let total = self.wins + self.losses;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(total) * 100.0
    }

    /// Moves `trade_size` from cash into a new position.
    pub fn open(
        &mut self,
        ticker: &str,
        price: Decimal,
        trade_size: Decimal,
        now: DateTime<Utc>,
    ) -> LedgerEvent {
        let position = self.portfolio.entry(ticker.to_string()).or_default();
        *position = Position {
            status: PositionStatus::Invested,
            entry_price: price,
            invested: trade_size,
            last_pnl: None,
            opened_at: Some(now),
        };
        self.balance -= trade_size;

        LedgerEvent::Opened {
            ticker: ticker.to_string(),
            price,
            invested: trade_size,
        }
    }

    /// Credits margin plus net P&L back to cash and records the trade.
    pub fn close(
        &mut self,
        ticker: &str,
        outcome: TradeOutcome,
        exit_price: Decimal,
        pnl: &PnlBreakdown,
        now: DateTime<Utc>,
    ) -> LedgerEvent {
        let position = self.portfolio.entry(ticker.to_string()).or_default();
        let record = TradeRecord {
            id: Uuid::new_v4(),
            ticker: ticker.to_string(),
            outcome,
            net_pnl: pnl.net_pnl,
            net_pnl_pct: pnl.net_pnl_pct,
            entry_price: position.entry_price,
            exit_price,
            invested: position.invested,
            commission: pnl.commission,
            closed_at: now,
        };

        self.balance += position.invested + pnl.net_pnl;
        position.status = PositionStatus::Cash;
        position.last_pnl = None;
        position.opened_at = None;

        match outcome {
            TradeOutcome::Win => self.wins += 1,
            TradeOutcome::Loss => self.losses += 1,
        }
        self.history.push(record.clone());
        self.truncate_history();

        LedgerEvent::Closed(record)
    }

    pub fn mark(&mut self, ticker: &str, net_pnl: Decimal) {
        if let Some(position) = self.portfolio.get_mut(ticker) {
            position.last_pnl = Some(net_pnl);
        }
    }

    fn truncate_history(&mut self) {
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dec, risk, tickers};

    fn invested(entry: &str, margin: &str) -> Position {
        Position {
            status: PositionStatus::Invested,
            entry_price: dec(entry),
            invested: dec(margin),
            last_pnl: None,
            opened_at: None,
        }
    }

    #[test]
    fn pnl_breakdown_matches_worked_example() {
        let pnl = PnlBreakdown::compute(&invested("100", "1000"), dec("100.85"), &risk());

        assert_eq!(pnl.gross_value, dec("5042.5"));
        assert_eq!(pnl.leveraged_invested, dec("5000"));
        assert_eq!(pnl.gross_pnl, dec("42.5"));
        assert_eq!(pnl.commission, dec("5"));
        assert_eq!(pnl.net_pnl, dec("37.5"));
        assert_eq!(pnl.net_pnl_pct, dec("0.0375"));
        assert_eq!(pnl.exit_outcome(&risk()), Some(TradeOutcome::Win));
    }

    #[test]
    fn flat_price_costs_commission_but_stays_open() {
        let pnl = PnlBreakdown::compute(&invested("100", "1000"), dec("100"), &risk());

        assert_eq!(pnl.net_pnl, dec("-5"));
        assert_eq!(pnl.net_pnl_pct, dec("-0.005"));
        assert_eq!(pnl.exit_outcome(&risk()), None);
    }

    #[test]
    fn stop_triggers_at_threshold() {
        // gross -3.5 on 5000 exposure, minus 5 commission
        let pnl = PnlBreakdown::compute(&invested("100", "1000"), dec("99.93"), &risk());

        assert_eq!(pnl.net_pnl_pct, dec("-0.0085"));
        assert_eq!(pnl.exit_outcome(&risk()), Some(TradeOutcome::Loss));
    }

    #[test]
    fn target_wins_tie_break() {
        let mut params = risk();
        params.target_net_profit = dec("-0.01");
        let pnl = PnlBreakdown::compute(&invested("100", "1000"), dec("99.93"), &params);

        assert_eq!(pnl.exit_outcome(&params), Some(TradeOutcome::Win));
    }

    #[test]
    fn open_debits_trade_size() {
        let mut account = Account::new(dec("10000"), &tickers());
        let trade_size = account.equity * risk().allocation_pct;
        assert_eq!(trade_size, dec("1000"));

        account.open("NVDA", dec("100"), trade_size, Utc::now());

        assert_eq!(account.balance, dec("9000"));
        assert_eq!(account.open_positions(), 1);
        let position = account.position("NVDA").unwrap();
        assert_eq!(position.entry_price, dec("100"));
        assert_eq!(position.invested, dec("1000"));
    }

    #[test]
    fn close_credits_margin_plus_net_pnl() {
        let mut account = Account::new(dec("10000"), &tickers());
        account.open("NVDA", dec("100"), dec("1000"), Utc::now());
        let pnl = PnlBreakdown::compute(account.position("NVDA").unwrap(), dec("100.85"), &risk());

        let event = account.close("NVDA", TradeOutcome::Win, dec("100.85"), &pnl, Utc::now());

        assert_eq!(account.balance, dec("10037.5"));
        assert_eq!(account.wins, 1);
        assert_eq!(account.open_positions(), 0);
        match event {
            LedgerEvent::Closed(record) => {
                assert_eq!(record.net_pnl, dec("37.5"));
                assert_eq!(record.entry_price, dec("100"));
                assert_eq!(record.invested, dec("1000"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn history_drops_oldest_beyond_limit() {
        let mut account = Account::new(dec("100000"), &tickers());
        for _ in 0..HISTORY_LIMIT + 5 {
            account.open("TSLA", dec("10"), dec("100"), Utc::now());
            let pnl = PnlBreakdown::compute(account.position("TSLA").unwrap(), dec("9"), &risk());
            account.close("TSLA", TradeOutcome::Loss, dec("9"), &pnl, Utc::now());
        }
        let newest = account.history.last().unwrap().id;

        assert_eq!(account.history.len(), HISTORY_LIMIT);
        assert_eq!(account.losses as usize, HISTORY_LIMIT + 5);
        account.open("TSLA", dec("10"), dec("100"), Utc::now());
        let pnl = PnlBreakdown::compute(account.position("TSLA").unwrap(), dec("11"), &risk());
        account.close("TSLA", TradeOutcome::Win, dec("11"), &pnl, Utc::now());
        assert_eq!(account.history.len(), HISTORY_LIMIT);
        assert_eq!(account.history[HISTORY_LIMIT - 2].id, newest);
    }

    #[test]
    fn reconcile_adds_new_tickers_as_cash() {
        let mut account = Account::new(dec("10000"), &["NVDA".to_string()]);
        account.reconcile(&tickers());

        assert_eq!(account.portfolio.len(), tickers().len());
        assert!(account.portfolio.values().all(|p| !p.is_invested()));
    }

    #[test]
    fn consistency_rejects_unvaluable_positions() {
        let mut account = Account::new(dec("10000"), &tickers());
        assert!(account.check_consistency().is_ok());

        account.open("TSLA", dec("250"), dec("1000"), Utc::now());
        assert!(account.check_consistency().is_ok());

        account.portfolio.get_mut("TSLA").unwrap().invested = Decimal::ZERO;
        let err = account.check_consistency().unwrap_err();
        assert!(err.starts_with("TSLA"));

        let mut broke = Account::new(dec("-1"), &tickers());
        broke.portfolio.clear();
        assert!(broke.check_consistency().is_err());
    }

    #[test]
    fn win_rate_is_percentage() {
        let mut account = Account::new(dec("10000"), &tickers());
        assert_eq!(account.win_rate(), 0.0);
        account.wins = 3;
        account.losses = 1;
        assert_eq!(account.win_rate(), 75.0);
    }
}

// src/core/evaluator.rs
use crate::config::RiskParams;
use crate::core::ledger::{Account, PnlBreakdown};
use crate::strategies::traits::EntryStrategy;
use crate::types::{LedgerEvent, MarketSnapshot, TickerMark};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub events: Vec<LedgerEvent>,
    pub marks: Vec<TickerMark>,
}

impl CycleOutcome {
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Runs one decision pass over `tickers` in order, mutating `account`.
///
/// Open positions are marked and closed on the target/stop band; flat tickers
/// are checked against `strategy` when `trading_enabled`. A ticker closed in
/// this pass is not re-entered until the next one.
pub fn evaluate(
    account: &mut Account,
    snapshot: &MarketSnapshot,
    tickers: &[String],
    strategy: &dyn EntryStrategy,
    risk: &RiskParams,
    trading_enabled: bool,
    now: DateTime<Utc>,
) -> CycleOutcome {
    let mut outcome = CycleOutcome::default();
    let mut running_equity = account.balance;

    for ticker in tickers {
        let latest_price = snapshot
            .latest(ticker)
            .and_then(|c| Decimal::from_f64(c.close))
            .filter(|p| *p > Decimal::ZERO);

        let position = account.position(ticker).cloned().unwrap_or_default();

        if !position.is_valuable() {
            warn!("{}: invested position has no usable entry price, skipped", ticker);
            continue;
        }

        if position.is_invested() {
            // Stale fallback: entry price keeps the position valued at cost.
            let price = latest_price.unwrap_or(position.entry_price);
            if price <= Decimal::ZERO {
                continue;
            }

            let pnl = PnlBreakdown::compute(&position, price, risk);
            running_equity += position.invested + pnl.net_pnl;

            match pnl.exit_outcome(risk) {
                Some(result) => {
                    let event = account.close(ticker, result, price, &pnl, now);
                    outcome.events.push(event);
                }
                None => account.mark(ticker, pnl.net_pnl),
            }

            outcome.marks.push(TickerMark {
                ticker: ticker.clone(),
                price: Some(price),
                net_pnl: Some(pnl.net_pnl),
            });
            continue;
        }

        outcome.marks.push(TickerMark {
            ticker: ticker.clone(),
            price: latest_price,
            net_pnl: None,
        });

        if !trading_enabled {
            continue;
        }
        let (Some(price), Some((prev, curr))) = (latest_price, snapshot.last_two(ticker)) else {
            debug!("{}: no usable candles this cycle", ticker);
            continue;
        };

        let trade_size = if strategy.exclusive() {
            if account.open_positions() > 0 {
                continue;
            }
            account.balance
        } else {
            account.equity * risk.allocation_pct
        };

        if trade_size <= Decimal::ZERO || account.balance < trade_size {
            continue;
        }

        if strategy.should_enter(prev, curr) {
            let event = account.open(ticker, price, trade_size, now);
            outcome.events.push(event);
        }
    }

    account.equity = running_equity;
    if outcome.changed() {
        account.last_update = Some(now);
    }
    outcome
}

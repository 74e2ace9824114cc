// src/types.rs
use crate::utils::precision::{percent, signed_usd, usd};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Indicator values attached to a candle. `None` while an indicator is still warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSet {
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub ema_200: Option<f64>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: IndicatorSet,
}

impl Candle {
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }
}

/// Most recent candles per ticker for one decision cycle (oldest first, at most two).
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    candles: HashMap<String, Vec<Candle>>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, mut candles: Vec<Candle>) {
        if candles.len() > 2 {
            candles.drain(..candles.len() - 2);
        }
        self.candles.insert(ticker.into(), candles);
    }

    pub fn latest(&self, ticker: &str) -> Option<&Candle> {
        self.candles.get(ticker).and_then(|c| c.last())
    }

    /// `(previous, current)` when the ticker has two candles.
    pub fn last_two(&self, ticker: &str) -> Option<(&Candle, &Candle)> {
        match self.candles.get(ticker).map(Vec::as_slice) {
            Some([prev, curr]) => Some((prev, curr)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    #[default]
    Cash,
    Invested,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub status: PositionStatus,
    pub entry_price: Decimal,
    pub invested: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pnl: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_invested(&self) -> bool {
        self.status == PositionStatus::Invested
    }

    /// An invested position needs a positive entry price and margin to be valued.
    pub fn is_valuable(&self) -> bool {
        !self.is_invested() || (self.entry_price > Decimal::ZERO && self.invested > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub ticker: String,
    pub outcome: TradeOutcome,
    pub net_pnl: Decimal,
    pub net_pnl_pct: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub invested: Decimal,
    pub commission: Decimal,
    pub closed_at: DateTime<Utc>,
}

/// Lifecycle change produced by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Opened {
        ticker: String,
        price: Decimal,
        invested: Decimal,
    },
    Closed(TradeRecord),
}

impl LedgerEvent {
    /// Human readable line for notifications and the dashboard log.
    pub fn describe(&self) -> String {
        match self {
            LedgerEvent::Opened {
                ticker,
                price,
                invested,
            } => format!(
                "🚀 ENTRY: {}\nPrice: {}\nMargin: {}",
                ticker,
                price,
                usd(*invested)
            ),
            LedgerEvent::Closed(record) => match record.outcome {
                TradeOutcome::Win => format!(
                    "✅ WIN: {}\nNet profit: {} ({})\n(Commission paid: {})",
                    record.ticker,
                    signed_usd(record.net_pnl),
                    percent(record.net_pnl_pct),
                    usd(record.commission)
                ),
                TradeOutcome::Loss => format!(
                    "❌ LOSS: {}\nNet loss: {} ({})",
                    record.ticker,
                    signed_usd(record.net_pnl),
                    percent(record.net_pnl_pct)
                ),
            },
        }
    }
}

/// Live per-ticker view for the dashboard; not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerMark {
    pub ticker: String,
    pub price: Option<Decimal>,
    pub net_pnl: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Marks(Vec<TickerMark>),
    Ledger(LedgerEvent),
    Log(String),
}

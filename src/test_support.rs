// src/test_support.rs
//! Builders shared by unit tests.

use crate::config::{RiskParams, StrategyConfig, StrategyKind};
use crate::types::{Candle, IndicatorSet};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn risk() -> RiskParams {
    RiskParams {
        leverage: dec("5"),
        allocation_pct: dec("0.10"),
        target_net_profit: dec("0.0085"),
        stop_loss_pct: dec("0.0085"),
        commission_rate: dec("0.001"),
    }
}

pub fn tickers() -> Vec<String> {
    ["NVDA", "TSLA", "GLD"].iter().map(|t| t.to_string()).collect()
}

pub fn strategy_config() -> StrategyConfig {
    StrategyConfig {
        kind: StrategyKind::ActiveMomentum,
        rsi_floor: 40.0,
        rsi_ceiling: 70.0,
        rsi_cross_level: 50.0,
        rsi_oversold: 35.0,
        adx_min: 25.0,
        sniper_adx_min: 20.0,
        stoch_oversold: 20.0,
    }
}

pub fn candle_with(close: f64, set: impl FnOnce(&mut IndicatorSet)) -> Candle {
    let mut indicators = IndicatorSet::default();
    set(&mut indicators);
    Candle {
        timestamp: 0,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000.0,
        indicators,
    }
}

/// A `(prev, curr)` pair that satisfies the active momentum rule at `close`.
pub fn bullish_pair(close: f64) -> Vec<Candle> {
    vec![
        candle_with(close - 0.5, |i| i.rsi = Some(50.0)),
        candle_with(close, |i| {
            i.rsi = Some(55.0);
            i.ema_20 = Some(close - 1.0);
        }),
    ]
}

/// A `(prev, curr)` pair that fails the active momentum rule at `close`.
pub fn bearish_pair(close: f64) -> Vec<Candle> {
    vec![
        candle_with(close + 0.5, |i| i.rsi = Some(55.0)),
        candle_with(close, |i| {
            i.rsi = Some(45.0);
            i.ema_20 = Some(close + 1.0);
        }),
    ]
}

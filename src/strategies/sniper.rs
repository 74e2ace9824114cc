// src/strategies/sniper.rs
use crate::config::StrategyConfig;
use crate::strategies::conditions::{close_above, crossed_above_level};
use crate::strategies::traits::EntryStrategy;
use crate::types::Candle;

/// One shot at a time: all conditions must line up and the whole balance goes in.
pub struct Sniper {
    rsi_cross_level: f64,
    adx_min: f64,
}

impl Sniper {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            rsi_cross_level: config.rsi_cross_level,
            adx_min: config.sniper_adx_min,
        }
    }
}

impl EntryStrategy for Sniper {
    fn name(&self) -> &'static str {
        "sniper"
    }

    fn min_candles(&self) -> usize {
        30
    }

    fn exclusive(&self) -> bool {
        true
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        close_above(curr, curr.indicators.ema_20)
            && crossed_above_level(prev.indicators.rsi, curr.indicators.rsi, self.rsi_cross_level)
            && curr.indicators.adx.is_some_and(|adx| adx > self.adx_min)
            && curr.is_green()
    }
}

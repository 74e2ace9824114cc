// src/strategies/momentum.rs
use crate::config::StrategyConfig;
use crate::strategies::conditions::{close_above, crossed_above_level, rising, within};
use crate::strategies::traits::EntryStrategy;
use crate::types::Candle;

/// Price above EMA20 with RSI in a healthy zone and pointing up.
pub struct ActiveMomentum {
    rsi_floor: f64,
    rsi_ceiling: f64,
}

impl ActiveMomentum {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            rsi_floor: config.rsi_floor,
            rsi_ceiling: config.rsi_ceiling,
        }
    }
}

impl EntryStrategy for ActiveMomentum {
    fn name(&self) -> &'static str {
        "active_momentum"
    }

    fn min_candles(&self) -> usize {
        30
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        let trend_ok = close_above(curr, curr.indicators.ema_20);
        let rsi_zone_ok = within(curr.indicators.rsi, self.rsi_floor, self.rsi_ceiling);
        let rsi_pointing_up = rising(prev.indicators.rsi, curr.indicators.rsi);

        trend_ok && rsi_zone_ok && rsi_pointing_up
    }
}

/// Price above EMA50, RSI crossing the midline and a trending market (ADX).
pub struct TrendStrength {
    rsi_cross_level: f64,
    adx_min: f64,
}

impl TrendStrength {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            rsi_cross_level: config.rsi_cross_level,
            adx_min: config.adx_min,
        }
    }
}

impl EntryStrategy for TrendStrength {
    fn name(&self) -> &'static str {
        "trend_strength"
    }

    fn min_candles(&self) -> usize {
        50
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        let trend_ok = close_above(curr, curr.indicators.ema_50);
        let rsi_cross = crossed_above_level(
            prev.indicators.rsi,
            curr.indicators.rsi,
            self.rsi_cross_level,
        );
        let strong = curr.indicators.adx.is_some_and(|adx| adx > self.adx_min);

        trend_ok && rsi_cross && strong
    }
}

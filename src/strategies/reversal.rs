// src/strategies/reversal.rs
use crate::config::StrategyConfig;
use crate::strategies::conditions::{below, close_above, crossed_above, rising};
use crate::strategies::traits::EntryStrategy;
use crate::types::Candle;

/// Long-term uptrend (EMA200) with a MACD bullish cross still under zero.
pub struct MacdReversal;

impl EntryStrategy for MacdReversal {
    fn name(&self) -> &'static str {
        "macd_reversal"
    }

    fn min_candles(&self) -> usize {
        200
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        let trend_ok = close_above(curr, curr.indicators.ema_200);
        let macd_cross = crossed_above(
            prev.indicators.macd,
            prev.indicators.macd_signal,
            curr.indicators.macd,
            curr.indicators.macd_signal,
        );
        let negative_zone = below(curr.indicators.macd, 0.0);

        trend_ok && macd_cross && negative_zone
    }
}

/// StochRSI K crossing D out of the oversold band while above EMA50.
pub struct StochRsiBounce {
    oversold: f64,
}

impl StochRsiBounce {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            oversold: config.stoch_oversold,
        }
    }
}

impl EntryStrategy for StochRsiBounce {
    fn name(&self) -> &'static str {
        "stoch_rsi_bounce"
    }

    fn min_candles(&self) -> usize {
        50
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        let trend_ok = close_above(curr, curr.indicators.ema_50);
        let k_cross = crossed_above(
            prev.indicators.stoch_k,
            prev.indicators.stoch_d,
            curr.indicators.stoch_k,
            curr.indicators.stoch_d,
        );
        let was_oversold = below(prev.indicators.stoch_k, self.oversold);

        trend_ok && k_cross && was_oversold
    }
}

/// Buys an oversold RSI that has started to turn, confirmed by a green candle.
pub struct OversoldDip {
    oversold: f64,
}

impl OversoldDip {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            oversold: config.rsi_oversold,
        }
    }
}

impl EntryStrategy for OversoldDip {
    fn name(&self) -> &'static str {
        "oversold_dip"
    }

    fn min_candles(&self) -> usize {
        30
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool {
        below(curr.indicators.rsi, self.oversold)
            && rising(prev.indicators.rsi, curr.indicators.rsi)
            && curr.is_green()
    }
}

// src/strategies/traits.rs
use crate::types::Candle;

/// An entry rule evaluated on the two most recent candles of a flat ticker.
pub trait EntryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candles a ticker needs before its indicators are trusted.
    fn min_candles(&self) -> usize;

    /// Exclusive strategies hold at most one position at a time and commit the
    /// whole balance to it.
    fn exclusive(&self) -> bool {
        false
    }

    fn should_enter(&self, prev: &Candle, curr: &Candle) -> bool;
}

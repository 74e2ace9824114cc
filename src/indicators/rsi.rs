// src/indicators/rsi.rs
//! Relative Strength Index with Wilder's smoothing.
//!
//! The first averages are the simple mean of the first `period` gains and
//! losses; after that `avg = (prev * (period - 1) + current) / period`.
//! `RSI = 100 - 100 / (1 + avg_gain / avg_loss)`, and 100 when there were no losses.

use crate::error::DataError;
use ta::Next;

pub struct WilderRsi {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self, DataError> {
        if period == 0 {
            return Err(DataError::Indicator("rsi: period must be positive".into()));
        }
        Ok(Self {
            period,
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        })
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss)
        }
    }
}

impl Next<f64> for WilderRsi {
    /// `None` until `period` price changes have been seen.
    type Output = Option<f64>;

    fn next(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        let period = self.period as f64;
        self.changes += 1;
        if self.changes <= self.period {
            self.avg_gain += gain / period;
            self.avg_loss += loss / period;
            if self.changes < self.period {
                return None;
            }
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }
        Some(self.value())
    }
}

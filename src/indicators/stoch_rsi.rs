// src/indicators/stoch_rsi.rs
use crate::error::DataError;
use crate::indicators::rsi::WilderRsi;
use ta::indicators::{Maximum, Minimum, SimpleMovingAverage};
use ta::Next;

/// Stochastic oscillator applied to Wilder RSI, with %K and %D smoothing.
pub struct StochRsi {
    rsi: WilderRsi,
    max: Maximum,
    min: Minimum,
    k: SimpleMovingAverage,
    d: SimpleMovingAverage,
    warmup: usize,
    seen: usize,
}

impl StochRsi {
    pub fn new(
        rsi_period: usize,
        stoch_period: usize,
        k_period: usize,
        d_period: usize,
    ) -> Result<Self, DataError> {
        let setup = |e: ta::errors::TaError| DataError::Indicator(format!("stoch rsi: {e:?}"));
        Ok(Self {
            rsi: WilderRsi::new(rsi_period)?,
            max: Maximum::new(stoch_period).map_err(setup)?,
            min: Minimum::new(stoch_period).map_err(setup)?,
            k: SimpleMovingAverage::new(k_period).map_err(setup)?,
            d: SimpleMovingAverage::new(d_period).map_err(setup)?,
            warmup: stoch_period + k_period + d_period - 3,
            seen: 0,
        })
    }

    /// Returns `(k, d)` in 0..=100 once enough closes have been fed.
    pub fn next(&mut self, close: f64) -> Option<(f64, f64)> {
        let rsi = self.rsi.next(close)?;
        let highest = self.max.next(rsi);
        let lowest = self.min.next(rsi);
        let stoch = if highest > lowest {
            (rsi - lowest) / (highest - lowest) * 100.0
        } else {
            0.0
        };
        let k = self.k.next(stoch);
        let d = self.d.next(k);

        self.seen += 1;
        (self.seen > self.warmup).then_some((k, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range() {
        let mut stoch = StochRsi::new(14, 14, 3, 3).unwrap();
        let mut produced = 0;
        for i in 0..120 {
            let close = 100.0 + (i as f64 * 0.3).sin() * 5.0;
            if let Some((k, d)) = stoch.next(close) {
                produced += 1;
                assert!((-1e-9..=100.0 + 1e-9).contains(&k));
                assert!((-1e-9..=100.0 + 1e-9).contains(&d));
            }
        }
        // rsi from bar 14, full %D window after 18 rsi values
        assert_eq!(produced, 120 - 31);
    }

    #[test]
    fn rejects_zero_period() {
        assert!(StochRsi::new(0, 14, 3, 3).is_err());
    }
}

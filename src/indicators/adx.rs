// src/indicators/adx.rs
//! Average Directional Index with Wilder smoothing.

pub struct AverageDirectionalIndex {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    seen: usize,
    tr: f64,
    plus_dm: f64,
    minus_dm: f64,
    dx_sum: f64,
    dx_count: usize,
    adx: Option<f64>,
}

impl AverageDirectionalIndex {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev: None,
            seen: 0,
            tr: 0.0,
            plus_dm: 0.0,
            minus_dm: 0.0,
            dx_sum: 0.0,
            dx_count: 0,
            adx: None,
        }
    }

    /// Feeds one bar; returns the ADX once `2 * period` bars have been seen.
    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return None;
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        let up = high - prev_high;
        let down = prev_low - low;
        let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };

        let period = self.period as f64;
        self.seen += 1;
        if self.seen <= self.period {
            self.tr += tr;
            self.plus_dm += plus_dm;
            self.minus_dm += minus_dm;
            if self.seen < self.period {
                return None;
            }
        } else {
            self.tr = self.tr - self.tr / period + tr;
            self.plus_dm = self.plus_dm - self.plus_dm / period + plus_dm;
            self.minus_dm = self.minus_dm - self.minus_dm / period + minus_dm;
        }

        let dx = self.dx();
        match self.adx {
            Some(adx) => {
                let next = (adx * (period - 1.0) + dx) / period;
                self.adx = Some(next);
            }
            None => {
                self.dx_sum += dx;
                self.dx_count += 1;
                if self.dx_count == self.period {
                    self.adx = Some(self.dx_sum / period);
                }
            }
        }
        self.adx
    }

    fn dx(&self) -> f64 {
        if self.tr == 0.0 {
            return 0.0;
        }
        let plus_di = 100.0 * self.plus_dm / self.tr;
        let minus_di = 100.0 * self.minus_dm / self.tr;
        let sum = plus_di + minus_di;
        if sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / sum
        }
    }
}

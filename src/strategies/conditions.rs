// src/strategies/conditions.rs
//! Building blocks shared by the entry rules. A missing indicator value
//! always makes a condition false.

use crate::types::Candle;

pub fn close_above(candle: &Candle, level: Option<f64>) -> bool {
    level.is_some_and(|level| candle.close > level)
}

pub fn within(value: Option<f64>, floor: f64, ceiling: f64) -> bool {
    value.is_some_and(|v| v > floor && v < ceiling)
}

pub fn below(value: Option<f64>, level: f64) -> bool {
    value.is_some_and(|v| v < level)
}

pub fn rising(prev: Option<f64>, curr: Option<f64>) -> bool {
    matches!((prev, curr), (Some(p), Some(c)) if c > p)
}

/// `curr` moved from at-or-below `level` to strictly above it.
pub fn crossed_above_level(prev: Option<f64>, curr: Option<f64>, level: f64) -> bool {
    matches!((prev, curr), (Some(p), Some(c)) if p <= level && c > level)
}

/// Line `a` crossed line `b` from below between the two candles.
pub fn crossed_above(
    prev_a: Option<f64>,
    prev_b: Option<f64>,
    curr_a: Option<f64>,
    curr_b: Option<f64>,
) -> bool {
    match (prev_a, prev_b, curr_a, curr_b) {
        (Some(pa), Some(pb), Some(ca), Some(cb)) => pa <= pb && ca > cb,
        _ => false,
    }
}

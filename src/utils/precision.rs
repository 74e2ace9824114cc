// src/utils/precision.rs
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a cash amount to cents, half away from zero.
/// Example: 37.505 -> 37.51, -8.505 -> -8.51
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `37.5` -> `"+37.50$"`, `-8.5` -> `"-8.50$"`.
pub fn signed_usd(amount: Decimal) -> String {
    let rounded = round_money(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{:.2}$", rounded)
    } else {
        format!("+{:.2}$", rounded.abs())
    }
}

pub fn usd(amount: Decimal) -> String {
    format!("{:.2}$", round_money(amount))
}

/// Fraction to percent with two decimals: `0.0375` -> `"3.75%"`.
pub fn percent(fraction: Decimal) -> String {
    let pct = (fraction * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}%", pct)
}

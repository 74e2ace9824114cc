// src/indicators/mod.rs
pub mod adx;
pub mod rsi;
pub mod stoch_rsi;

use crate::error::DataError;
use crate::types::Candle;
use adx::AverageDirectionalIndex;
use rsi::WilderRsi;
use stoch_rsi::StochRsi;
use ta::indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence};
use ta::Next;

const RSI_PERIOD: usize = 14;
const ADX_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

fn setup(name: &'static str) -> impl Fn(ta::errors::TaError) -> DataError {
    move |e| DataError::Indicator(format!("{name}: {e:?}"))
}

/// Fills `indicators` on every candle, oldest first. Values stay `None` until
/// the indicator has seen enough bars.
pub fn annotate(candles: &mut [Candle]) -> Result<(), DataError> {
    let mut ema_20 = ExponentialMovingAverage::new(20).map_err(setup("ema20"))?;
    let mut ema_50 = ExponentialMovingAverage::new(50).map_err(setup("ema50"))?;
    let mut ema_200 = ExponentialMovingAverage::new(200).map_err(setup("ema200"))?;
    let mut rsi = WilderRsi::new(RSI_PERIOD)?;
    let mut macd = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
        .map_err(setup("macd"))?;
    let mut adx = AverageDirectionalIndex::new(ADX_PERIOD);
    let mut stoch = StochRsi::new(RSI_PERIOD, RSI_PERIOD, 3, 3)?;

    for (i, candle) in candles.iter_mut().enumerate() {
        let bars = i + 1;
        let close = candle.close;
        let ready = |period: usize| bars >= period;

        let set = &mut candle.indicators;
        set.ema_20 = Some(ema_20.next(close)).filter(|_| ready(20));
        set.ema_50 = Some(ema_50.next(close)).filter(|_| ready(50));
        set.ema_200 = Some(ema_200.next(close)).filter(|_| ready(200));
        set.rsi = rsi.next(close);

        let macd_out = macd.next(close);
        let macd_ready = ready(MACD_SLOW + MACD_SIGNAL - 1);
        set.macd = Some(macd_out.macd).filter(|_| macd_ready);
        set.macd_signal = Some(macd_out.signal).filter(|_| macd_ready);

        set.adx = adx.next(candle.high, candle.low, close);

        let (k, d) = stoch.next(close).unzip();
        set.stoch_k = k;
        set.stoch_d = d;
    }
    Ok(())
}

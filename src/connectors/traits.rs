// src/connectors/traits.rs
use crate::error::{DataError, NotifyError};
use crate::types::MarketSnapshot;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest candles with indicators for each ticker that has at least
    /// `min_candles` of history. Tickers without enough data are left out.
    async fn fetch_snapshot(
        &self,
        tickers: &[String],
        min_candles: usize,
    ) -> Result<MarketSnapshot, DataError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

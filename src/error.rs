// src/error.rs
use thiserror::Error;

/// Failures from the market-data side of a cycle.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("chart api error for {ticker}: {code} - {description}")]
    Api {
        ticker: String,
        code: String,
        description: String,
    },

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("insufficient history for {ticker}: have {have} candles, need {need}")]
    InsufficientHistory {
        ticker: String,
        have: usize,
        need: usize,
    },

    #[error("indicator setup failed: {0}")]
    Indicator(String),

    #[error("market data unavailable for every ticker")]
    Unavailable,
}

impl DataError {
    /// Retryable errors abort the cycle and are retried on the next tick;
    /// the rest only drop the ticker they concern.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataError::Http(_) | DataError::Api { .. } | DataError::Unavailable
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

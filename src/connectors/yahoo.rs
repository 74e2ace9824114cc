// src/connectors/yahoo.rs
use crate::config::DataConfig;
use crate::connectors::messages::ChartResponse;
use crate::connectors::traits::MarketDataProvider;
use crate::error::DataError;
use crate::indicators;
use crate::types::{Candle, IndicatorSet, MarketSnapshot};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Minute candles from the Yahoo Finance chart API, one request per ticker.
pub struct YahooClient {
    http_client: Client,
    base_url: Url,
    range: String,
    interval: String,
    concurrency: usize,
}

impl YahooClient {
    pub fn new(config: &DataConfig) -> Result<Self, DataError> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DataError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            range: config.range.clone(),
            interval: config.interval.clone(),
            concurrency: config.concurrency.max(1),
        })
    }

    fn chart_url(&self, ticker: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(ticker);
        }
        url.query_pairs_mut()
            .append_pair("range", &self.range)
            .append_pair("interval", &self.interval);
        url
    }

    async fn fetch_candles(&self, ticker: &str) -> Result<Vec<Candle>, DataError> {
        let url = self.chart_url(ticker);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<ChartResponse>()
            .await?;

        parse_chart(ticker, response)
    }

    fn prepare(
        ticker: &str,
        mut candles: Vec<Candle>,
        min_candles: usize,
    ) -> Result<Vec<Candle>, DataError> {
        if candles.len() < min_candles {
            return Err(DataError::InsufficientHistory {
                ticker: ticker.to_string(),
                have: candles.len(),
                need: min_candles,
            });
        }
        indicators::annotate(&mut candles)?;
        Ok(candles)
    }
}

/// Turns the column-oriented chart payload into candles, dropping buckets
/// with any missing field.
pub fn parse_chart(ticker: &str, response: ChartResponse) -> Result<Vec<Candle>, DataError> {
    if let Some(error) = response.chart.error {
        return Err(DataError::Api {
            ticker: ticker.to_string(),
            code: error.code,
            description: error.description,
        });
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NoData(ticker.to_string()))?;
    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::NoData(ticker.to_string()))?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::NoData(ticker.to_string()))?;

    let field = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();
    let candles = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &timestamp)| {
            Some(Candle {
                timestamp,
                open: field(&quote.open, i)?,
                high: field(&quote.high, i)?,
                low: field(&quote.low, i)?,
                close: field(&quote.close, i)?,
                volume: field(&quote.volume, i).unwrap_or(0.0),
                indicators: IndicatorSet::default(),
            })
        })
        .collect();

    Ok(candles)
}

/// Folds per-ticker fetch results into a snapshot, in ticker order.
///
/// Tickers that fail for any non-transport reason are dropped. The cycle is
/// `Unavailable` only when every ticker failed with a retryable error.
pub fn assemble_snapshot(
    results: Vec<(String, Result<Vec<Candle>, DataError>)>,
    min_candles: usize,
) -> Result<MarketSnapshot, DataError> {
    let requested = results.len();
    let mut snapshot = MarketSnapshot::new();
    let mut transport_failures = 0;

    for (ticker, result) in results {
        match result.and_then(|candles| YahooClient::prepare(&ticker, candles, min_candles)) {
            Ok(candles) => snapshot.insert(ticker, candles),
            Err(e) if e.is_retryable() => {
                transport_failures += 1;
                warn!("{}: fetch failed: {}", ticker, e);
            }
            Err(e) => debug!("{}: skipped: {}", ticker, e),
        }
    }

    if requested > 0 && transport_failures == requested {
        return Err(DataError::Unavailable);
    }

    info!("Market snapshot: {}/{} tickers usable", snapshot.len(), requested);
    Ok(snapshot)
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_snapshot(
        &self,
        tickers: &[String],
        min_candles: usize,
    ) -> Result<MarketSnapshot, DataError> {
        let results: Vec<(String, Result<Vec<Candle>, DataError>)> =
            stream::iter(tickers.iter().cloned())
                .map(|ticker| async move {
                    let result = self.fetch_candles(&ticker).await;
                    (ticker, result)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        assemble_snapshot(results, min_candles)
    }
}

// src/connectors/messages.rs
use serde::{Deserialize, Serialize};

/// Response of `GET /v8/finance/chart/{symbol}`.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    pub quote: Vec<Quote>,
}

/// Column-oriented OHLCV; `null` marks a bucket without trades.
#[derive(Debug, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

/// Body of Telegram `sendMessage`.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: String,
    pub parse_mode: &'static str,
}

/// Envelope of every Bot API reply.
#[derive(Debug, Deserialize)]
pub struct BotApiReply {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}

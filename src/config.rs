// src/config.rs

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ActiveMomentum,
    TrendStrength,
    MacdReversal,
    StochRsiBounce,
    OversoldDip,
    Sniper,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub rsi_floor: f64,
    pub rsi_ceiling: f64,
    pub rsi_cross_level: f64,
    pub rsi_oversold: f64,
    pub adx_min: f64,
    pub sniper_adx_min: f64,
    pub stoch_oversold: f64,
}

impl StrategyConfig {
    /// Oscillator levels live on a 0..=100 scale, the RSI zone must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let levels = [
            ("rsi_floor", self.rsi_floor),
            ("rsi_ceiling", self.rsi_ceiling),
            ("rsi_cross_level", self.rsi_cross_level),
            ("rsi_oversold", self.rsi_oversold),
            ("adx_min", self.adx_min),
            ("sniper_adx_min", self.sniper_adx_min),
            ("stoch_oversold", self.stoch_oversold),
        ];
        if let Some((name, value)) = levels
            .iter()
            .find(|(_, v)| !(0.0..=100.0).contains(v))
        {
            return Err(ConfigError::Message(format!(
                "strategy.{name} must be within 0..=100, got {value}"
            )));
        }
        if self.rsi_floor >= self.rsi_ceiling {
            return Err(ConfigError::Message(
                "strategy.rsi_floor must be below strategy.rsi_ceiling".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub base_url: String,
    pub range: String,
    pub interval: String,
    pub request_timeout_secs: u64,
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub enabled: bool,
    pub refresh_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub dir: String,
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    pub leverage: Decimal,
    pub allocation_pct: Decimal,
    pub target_net_profit: Decimal,
    pub stop_loss_pct: Decimal,
    pub commission_rate: Decimal,
    pub initial_capital: Decimal,
    pub state_file: String,
    pub decision_interval_secs: u64,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

/// Settings the ledger needs on every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub leverage: Decimal,
    pub allocation_pct: Decimal,
    pub target_net_profit: Decimal,
    pub stop_loss_pct: Decimal,
    pub commission_rate: Decimal,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("Settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tickers")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default(
                "tickers",
                vec![
                    "NVDA", "TSLA", "AMZN", "META", "LLY", "JPM", "USO", "GLD", "BTC-USD", "COST",
                ],
            )?
            .set_default("leverage", "5")?
            .set_default("allocation_pct", "0.10")?
            .set_default("target_net_profit", "0.0085")?
            .set_default("stop_loss_pct", "0.0085")?
            .set_default("commission_rate", "0.001")?
            .set_default("initial_capital", "10000")?
            .set_default("state_file", "bot_active_data.json")?
            .set_default("decision_interval_secs", 60)?
            .set_default(
                "data.base_url",
                "https://query1.finance.yahoo.com/v8/finance/chart",
            )?
            .set_default("data.range", "5d")?
            .set_default("data.interval", "1m")?
            .set_default("data.request_timeout_secs", 20)?
            .set_default("data.concurrency", 4)?
            .set_default("strategy.kind", "active_momentum")?
            .set_default("strategy.rsi_floor", 40.0)?
            .set_default("strategy.rsi_ceiling", 70.0)?
            .set_default("strategy.rsi_cross_level", 50.0)?
            .set_default("strategy.rsi_oversold", 35.0)?
            .set_default("strategy.adx_min", 25.0)?
            .set_default("strategy.sniper_adx_min", 20.0)?
            .set_default("strategy.stoch_oversold", 20.0)?
            .set_default("ui.enabled", true)?
            .set_default("ui.refresh_secs", 10)?
            .set_default("log.dir", "logs")?
            .set_default("log.level", "info")
    }

    pub fn risk(&self) -> RiskParams {
        RiskParams {
            leverage: self.leverage,
            allocation_pct: self.allocation_pct,
            target_net_profit: self.target_net_profit,
            stop_loss_pct: self.stop_loss_pct,
            commission_rate: self.commission_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Message(msg.to_string()));

        if self.tickers.is_empty() {
            return invalid("tickers must not be empty");
        }
        if self.leverage <= Decimal::ZERO {
            return invalid("leverage must be positive");
        }
        if self.allocation_pct <= Decimal::ZERO || self.allocation_pct > Decimal::ONE {
            return invalid("allocation_pct must be in (0, 1]");
        }
        if self.target_net_profit < Decimal::ZERO || self.stop_loss_pct < Decimal::ZERO {
            return invalid("target_net_profit and stop_loss_pct must not be negative");
        }
        if self.commission_rate < Decimal::ZERO {
            return invalid("commission_rate must not be negative");
        }
        if self.initial_capital <= Decimal::ZERO {
            return invalid("initial_capital must be positive");
        }
        if self.decision_interval_secs == 0 || self.ui.refresh_secs == 0 {
            return invalid("intervals must be at least one second");
        }
        if self.data.concurrency == 0 {
            return invalid("data.concurrency must be at least 1");
        }
        self.strategy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn defaults() -> AppConfig {
        AppConfig::with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_match_active_bot() {
        let config = defaults();
        assert_eq!(config.tickers.len(), 10);
        assert_eq!(config.tickers[8], "BTC-USD");
        assert_eq!(config.leverage, Decimal::from(5));
        assert_eq!(config.allocation_pct, Decimal::from_str("0.10").unwrap());
        assert_eq!(config.target_net_profit, Decimal::from_str("0.0085").unwrap());
        assert_eq!(config.strategy.kind, StrategyKind::ActiveMomentum);
        assert_eq!(config.decision_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_allocation_above_one() {
        let mut config = defaults();
        config.allocation_pct = Decimal::from(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_ticker_list() {
        let mut config = defaults();
        config.tickers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_strategy_threshold() {
        let mut config = defaults();
        config.strategy.adx_min = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strategy.adx_min"));

        let mut config = defaults();
        config.strategy.stoch_oversold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_rsi_zone() {
        let mut config = defaults();
        config.strategy.rsi_floor = 70.0;
        config.strategy.rsi_ceiling = 40.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn strategy_kind_parses_snake_case() {
        let config: AppConfig = AppConfig::with_defaults(Config::builder())
            .unwrap()
            .set_override("strategy.kind", "stoch_rsi_bounce")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.strategy.kind, StrategyKind::StochRsiBounce);
    }
}

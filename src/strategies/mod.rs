// src/strategies/mod.rs
pub mod conditions;
pub mod momentum;
pub mod reversal;
pub mod sniper;
pub mod traits;

use crate::config::{StrategyConfig, StrategyKind};
use momentum::{ActiveMomentum, TrendStrength};
use reversal::{MacdReversal, OversoldDip, StochRsiBounce};
use sniper::Sniper;
use traits::EntryStrategy;

pub fn build_strategy(config: &StrategyConfig) -> Box<dyn EntryStrategy> {
    match config.kind {
        StrategyKind::ActiveMomentum => Box::new(ActiveMomentum::new(config)),
        StrategyKind::TrendStrength => Box::new(TrendStrength::new(config)),
        StrategyKind::MacdReversal => Box::new(MacdReversal),
        StrategyKind::StochRsiBounce => Box::new(StochRsiBounce::new(config)),
        StrategyKind::OversoldDip => Box::new(OversoldDip::new(config)),
        StrategyKind::Sniper => Box::new(Sniper::new(config)),
    }
}

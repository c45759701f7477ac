use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PriceLevel;

/// A print from the exchange trade tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTrade {
    /// Unix seconds.
    pub time: i64,
    pub price: Decimal,
    pub volume: Decimal,
}

impl MarketTrade {
    pub fn new(time: i64, price: Decimal, volume: Decimal) -> Self {
        Self {
            time,
            price,
            volume,
        }
    }
}

/// A tape entry after signal augmentation: either a real market trade with
/// its tick direction, or one of our synthetic contrarian trades.
///
/// For synthetic trades `volume` is a direction marker and not a size:
/// `-1` is a sell, `+1` is a buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub time: i64,
    pub price: Decimal,
    pub volume: Decimal,
    pub is_synthetic: bool,
    pub is_uptick: bool,
    pub is_downtick: bool,
}

impl Trade {
    pub fn real(trade: &MarketTrade, is_uptick: bool, is_downtick: bool) -> Self {
        Self {
            time: trade.time,
            price: trade.price,
            volume: trade.volume,
            is_synthetic: false,
            is_uptick,
            is_downtick,
        }
    }

    pub fn synthetic_sell(trigger: &MarketTrade) -> Self {
        Self::synthetic(trigger, Decimal::NEGATIVE_ONE)
    }

    pub fn synthetic_buy(trigger: &MarketTrade) -> Self {
        Self::synthetic(trigger, Decimal::ONE)
    }

    fn synthetic(trigger: &MarketTrade, direction: Decimal) -> Self {
        Self {
            time: trigger.time,
            price: trigger.price,
            volume: direction,
            is_synthetic: true,
            is_uptick: false,
            is_downtick: false,
        }
    }

    pub fn is_ours(&self) -> bool {
        self.is_synthetic
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Consistent read of the book and the augmented tape, taken under one lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Best bid first.
    pub bids: Vec<PriceLevel>,
    /// Best ask first.
    pub asks: Vec<PriceLevel>,
    /// Newest first.
    pub trades: Vec<Trade>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_synthetic_trades_carry_direction_only() {
        let trigger = MarketTrade::new(1_700_000_000, Decimal::new(4210050, 2), Decimal::new(3, 1));

        let sell = Trade::synthetic_sell(&trigger);
        let buy = Trade::synthetic_buy(&trigger);

        assert_eq!(sell.volume, Decimal::NEGATIVE_ONE);
        assert_eq!(buy.volume, Decimal::ONE);
        for t in [sell, buy] {
            assert!(t.is_ours());
            assert!(!t.is_uptick && !t.is_downtick);
            assert_eq!(t.price, trigger.price);
            assert_eq!(t.time, trigger.time);
        }
    }

    #[test]
    fn test_timestamp_conversion() {
        let trade = Trade::real(&MarketTrade::new(0, Decimal::ONE, Decimal::ONE), false, false);
        assert_eq!(trade.timestamp().map(|t| t.timestamp()), Some(0));
    }
}

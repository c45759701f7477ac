use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// A resting price level. Only exists while `volume` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub volume: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }

    /// Price rounded to cents for display, as the exchange UI shows it.
    pub fn display_price(&self) -> Decimal {
        self.price.round_dp(2)
    }
}

/// Parsed body of a diff event or a full order book response.
/// Both carry the same shape and are applied level by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl BookUpdate {
    pub fn level_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}

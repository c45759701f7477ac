use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use common::error::FeedError;
use common::models::{BookUpdate, PriceLevel};

use crate::traits::RemoteResponse;

/// `bids`/`asks` body shared by the diff channel and the REST order book.
#[derive(Deserialize, Debug, Clone)]
pub struct DepthPayload {
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

impl RemoteResponse<BookUpdate> for DepthPayload {
    fn to_model(&self) -> Result<BookUpdate, FeedError> {
        Ok(BookUpdate {
            bids: Self::parse_levels(&self.bids)?,
            asks: Self::parse_levels(&self.asks)?,
        })
    }
}

impl DepthPayload {
    fn parse_levels(items: &[[String; 2]]) -> Result<Vec<PriceLevel>, FeedError> {
        items
            .iter()
            .map(|[price, volume]| -> Result<PriceLevel, FeedError> {
                Ok(PriceLevel::new(
                    parse_decimal("price", price)?,
                    parse_decimal("volume", volume)?,
                ))
            })
            .collect()
    }
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, FeedError> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| FeedError::Parse(format!("{field} {raw:?}: {e}")))
}

use serde::Deserialize;

use common::error::FeedError;
use common::models::MarketTrade;

use super::orderbook_response::parse_decimal;
use crate::traits::RemoteResponse;

/// Bitstamp sends `date` as a numeric string; integers are accepted too.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum UnixSeconds {
    Int(i64),
    Text(String),
}

impl UnixSeconds {
    fn seconds(&self) -> Result<i64, FeedError> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Text(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| FeedError::Parse(format!("date {raw:?}: {e}"))),
        }
    }
}

/// One entry of `GET /transactions/{market}/`.
#[derive(Deserialize, Debug, Clone)]
pub struct TransactionEvent {
    pub date: UnixSeconds,
    pub price: String,
    #[serde(rename(deserialize = "amount"))]
    pub volume: String,
}

impl RemoteResponse<MarketTrade> for TransactionEvent {
    fn to_model(&self) -> Result<MarketTrade, FeedError> {
        Ok(MarketTrade {
            time: self.date.seconds()?,
            price: parse_decimal("price", &self.price)?,
            volume: parse_decimal("amount", &self.volume)?,
        })
    }
}

/// Converts the newest-first tape, keeping at most `limit` entries.
pub fn to_trade_tape(
    events: &[TransactionEvent],
    limit: usize,
) -> Result<Vec<MarketTrade>, FeedError> {
    events.iter().take(limit).map(|e| e.to_model()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const BODY: &str = r#"[
        {"date": "1700000060", "tid": "3", "amount": "0.02000000", "type": "1", "price": "37010"},
        {"date": 1700000030, "tid": "2", "amount": "0.5", "type": "0", "price": "37005.5"},
        {"date": "1700000000", "tid": "1", "amount": "1", "type": "0", "price": "37000"}
    ]"#;

    #[test]
    fn test_tape_keeps_order_and_parses_dates() {
        let events: Vec<TransactionEvent> = serde_json::from_str(BODY).unwrap();
        let tape = to_trade_tape(&events, 10).unwrap();

        assert_eq!(tape.len(), 3);
        assert_eq!(tape[0].time, 1_700_000_060);
        assert_eq!(tape[1].time, 1_700_000_030);
        assert_eq!(tape[1].price, Decimal::from_str("37005.5").unwrap());
        assert_eq!(tape[0].volume, Decimal::from_str("0.02").unwrap());
    }

    #[test]
    fn test_tape_is_limited_to_most_recent() {
        let events: Vec<TransactionEvent> = serde_json::from_str(BODY).unwrap();
        let tape = to_trade_tape(&events, 2).unwrap();

        assert_eq!(tape.len(), 2);
        assert_eq!(tape[0].time, 1_700_000_060);
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let events: Vec<TransactionEvent> =
            serde_json::from_str(r#"[{"date": "soon", "amount": "1", "price": "1"}]"#).unwrap();
        assert!(to_trade_tape(&events, 1).unwrap_err().is_parse());
    }

    #[test]
    fn test_missing_price_fails_to_deserialize() {
        assert!(
            serde_json::from_str::<Vec<TransactionEvent>>(r#"[{"date": "1", "amount": "1"}]"#)
                .is_err()
        );
    }
}

//! Two-sided price → volume ladder for one instrument.
//!
//! Bids and asks are kept in `BTreeMap`s keyed by price. Bids read back
//! highest first, asks lowest first. A level is present only while its volume
//! is non-zero.

use std::collections::BTreeMap;

use common::models::{PriceLevel, Side};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLedger {
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl PriceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the volume at `price`, or removes the level when `volume` is zero.
    ///
    /// Volumes are not validated; negative values are stored as given.
    pub fn upsert(&mut self, side: Side, price: Decimal, volume: Decimal) {
        let levels = self.side_mut(side);
        if volume.is_zero() {
            levels.remove(&price);
        } else {
            levels.insert(price, volume);
        }
    }

    /// Up to `k` levels, best price first.
    pub fn top_levels(&self, side: Side, k: usize) -> Vec<PriceLevel> {
        let to_level = |(price, volume): (&Decimal, &Decimal)| PriceLevel::new(*price, *volume);
        match side {
            Side::Bid => self.bids.iter().rev().take(k).map(to_level).collect(),
            Side::Ask => self.asks.iter().take(k).map(to_level).collect(),
        }
    }

    pub fn volume_at(&self, side: Side, price: Decimal) -> Option<Decimal> {
        self.side(side).get(&price).copied()
    }

    pub fn len(&self, side: Side) -> usize {
        self.side(side).len()
    }

    fn side(&self, side: Side) -> &BTreeMap<Decimal, Decimal> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, Decimal> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_upsert_then_remove_on_zero() {
        let mut ledger = PriceLedger::new();

        ledger.upsert(Side::Bid, dec("42000.10"), dec("0.5"));
        assert_eq!(
            ledger.top_levels(Side::Bid, 10),
            vec![PriceLevel::new(dec("42000.10"), dec("0.5"))]
        );

        ledger.upsert(Side::Bid, dec("42000.10"), dec("0"));
        assert!(ledger.top_levels(Side::Bid, 10).is_empty());
        assert_eq!(ledger.len(Side::Bid) + ledger.len(Side::Ask), 0);
    }

    #[test]
    fn test_zero_for_absent_level_is_noop() {
        let mut ledger = PriceLedger::new();
        ledger.upsert(Side::Ask, dec("1"), dec("2"));

        ledger.upsert(Side::Ask, dec("5"), Decimal::ZERO);

        assert_eq!(ledger.len(Side::Ask), 1);
        assert_eq!(ledger.len(Side::Bid), 0);
    }

    #[test]
    fn test_overwrite_keeps_one_level_per_price() {
        let mut ledger = PriceLedger::new();
        ledger.upsert(Side::Ask, dec("100.0"), dec("1"));
        ledger.upsert(Side::Ask, dec("100.00"), dec("3"));

        assert_eq!(ledger.len(Side::Ask), 1);
        assert_eq!(ledger.volume_at(Side::Ask, dec("100")), Some(dec("3")));
    }

    #[test]
    fn test_sides_are_independent() {
        let mut ledger = PriceLedger::new();
        ledger.upsert(Side::Bid, dec("10"), dec("1"));
        ledger.upsert(Side::Ask, dec("10"), dec("2"));
        ledger.upsert(Side::Bid, dec("10"), Decimal::ZERO);

        assert_eq!(ledger.len(Side::Bid), 0);
        assert_eq!(ledger.volume_at(Side::Ask, dec("10")), Some(dec("2")));
    }

    #[test]
    fn test_ordering_and_depth_limit() {
        let mut ledger = PriceLedger::new();
        for (p, v) in [("101", "1"), ("99", "2"), ("100", "3"), ("98", "4")] {
            ledger.upsert(Side::Bid, dec(p), dec(v));
            ledger.upsert(Side::Ask, dec(p), dec(v));
        }

        let bids = ledger.top_levels(Side::Bid, 3);
        let asks = ledger.top_levels(Side::Ask, 3);

        assert_eq!(bids.len(), 3);
        assert_eq!(asks.len(), 3);
        assert!(bids.windows(2).all(|w| w[0].price >= w[1].price));
        assert!(asks.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(bids[0].price, dec("101"));
        assert_eq!(asks[0].price, dec("98"));

        assert!(ledger.top_levels(Side::Bid, 0).is_empty());
    }

    #[test]
    fn test_repeated_upsert_is_idempotent() {
        let mut once = PriceLedger::new();
        let mut twice = PriceLedger::new();
        let updates = [
            (Side::Bid, "100", "1.5"),
            (Side::Ask, "101", "2"),
            (Side::Bid, "99", "0"),
        ];

        for (side, p, v) in updates {
            once.upsert(side, dec(p), dec(v));
        }
        for _ in 0..2 {
            for (side, p, v) in updates {
                twice.upsert(side, dec(p), dec(v));
            }
        }

        assert_eq!(once, twice);
    }

    #[test]
    fn test_negative_volume_is_stored_as_given() {
        let mut ledger = PriceLedger::new();
        ledger.upsert(Side::Bid, dec("10"), dec("-1"));
        assert_eq!(ledger.volume_at(Side::Bid, dec("10")), Some(dec("-1")));
    }
}

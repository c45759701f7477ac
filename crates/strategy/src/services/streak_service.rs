use std::cmp::Ordering;

use common::models::{MarketTrade, Trade};
use tracing::debug;

/// Contrarian streak detector.
///
/// Walks the tape from oldest to newest, counts consecutive upticks and
/// downticks, and answers a run of `upticks_to_sell` upticks with a synthetic
/// sell and a run of `downticks_to_buy` downticks with a synthetic buy.
/// Ties leave both counters untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSignalEngine {
    upticks_to_sell: u32,
    downticks_to_buy: u32,
}

#[derive(Debug, Default)]
struct Streaks {
    up: u32,
    down: u32,
}

impl StreakSignalEngine {
    pub fn new(upticks_to_sell: u32, downticks_to_buy: u32) -> Self {
        Self {
            upticks_to_sell,
            downticks_to_buy,
        }
    }

    /// Returns the tape with our synthetic trades merged in.
    ///
    /// `tape` is newest first, as the exchange delivers it, and so is the
    /// result. A synthetic trade shares time and price with the real trade
    /// that triggered it and is placed just ahead of it (more recent).
    pub fn augment(&self, tape: &[MarketTrade]) -> Vec<Trade> {
        let mut chronological = Vec::with_capacity(tape.len() + tape.len() / 2);
        let mut streaks = Streaks::default();
        let mut previous: Option<&MarketTrade> = None;

        for current in tape.iter().rev() {
            let Some(prev) = previous.replace(current) else {
                chronological.push(Trade::real(current, false, false));
                continue;
            };

            let direction = current.price.cmp(&prev.price);
            match direction {
                Ordering::Greater => {
                    streaks.up += 1;
                    streaks.down = 0;
                }
                Ordering::Less => {
                    streaks.down += 1;
                    streaks.up = 0;
                }
                Ordering::Equal => {}
            }

            chronological.push(Trade::real(
                current,
                direction == Ordering::Greater,
                direction == Ordering::Less,
            ));

            if streaks.up >= self.upticks_to_sell {
                debug!(time = current.time, price = %current.price, upticks = streaks.up, "uptick streak, selling");
                chronological.push(Trade::synthetic_sell(current));
                streaks.up = 0;
            }

            if streaks.down >= self.downticks_to_buy {
                debug!(time = current.time, price = %current.price, downticks = streaks.down, "downtick streak, buying");
                chronological.push(Trade::synthetic_buy(current));
                streaks.down = 0;
            }
        }

        chronological.reverse();
        chronological
    }
}

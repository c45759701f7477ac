use tokio::sync::mpsc;
use tracing::info;

use common::actors::{ShutdownSignal, shutdown_requested};
use common::models::{MarketSnapshot, PriceLevel, Trade};

const UPTICK: &str = "↑";
const DOWNTICK: &str = "↓";
const OUR_TRADE: &str = "x";

/// Logs the bid, ask and trade tables for every snapshot it receives.
pub struct ConsolePresenter {
    market: String,
    snapshot_rx: mpsc::Receiver<MarketSnapshot>,
}

impl ConsolePresenter {
    pub fn new(market: &str, snapshot_rx: mpsc::Receiver<MarketSnapshot>) -> Self {
        Self {
            market: market.to_string(),
            snapshot_rx,
        }
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                received = self.snapshot_rx.recv() => match received {
                    Some(snapshot) => {
                        for line in render(&self.market, &snapshot) {
                            info!("{line}");
                        }
                    }
                    None => break,
                },
            }
        }
    }
}

pub fn render(market: &str, snapshot: &MarketSnapshot) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.bids.len().max(snapshot.asks.len()) + snapshot.trades.len() + 4);

    lines.push(format!("[{}] order book", market.to_uppercase()));
    lines.push(format!(
        "{:>14} {:>16} | {:>14} {:>16}",
        "BID", "VOLUME", "ASK", "VOLUME"
    ));

    let rows = snapshot.bids.len().max(snapshot.asks.len());
    for row in 0..rows {
        let (bid, bid_volume) = level_cells(snapshot.bids.get(row));
        let (ask, ask_volume) = level_cells(snapshot.asks.get(row));
        lines.push(format!("{bid:>14} {bid_volume:>16} | {ask:>14} {ask_volume:>16}"));
    }

    lines.push(format!("[{}] trades", market.to_uppercase()));
    lines.push(format!("{:>8} {:>15} {:>16} {:>4}", "TIME", "PRICE", "VOLUME", "OURS"));
    lines.extend(snapshot.trades.iter().map(trade_row));

    lines
}

fn level_cells(level: Option<&PriceLevel>) -> (String, String) {
    match level {
        Some(level) => (level.display_price().to_string(), level.volume.to_string()),
        None => (String::new(), String::new()),
    }
}

fn trade_row(trade: &Trade) -> String {
    let time = trade
        .timestamp()
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| trade.time.to_string());

    let tick = if trade.is_uptick {
        UPTICK
    } else if trade.is_downtick {
        DOWNTICK
    } else {
        " "
    };
    let ours = if trade.is_ours() { OUR_TRADE } else { "" };
    let price = format!("{}{tick}", trade.price.round_dp(2));

    format!("{time:>8} {price:>15} {:>16} {ours:>4}", trade.volume.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::MarketTrade;
    use rust_decimal::Decimal;

    fn snapshot() -> MarketSnapshot {
        let trigger = MarketTrade::new(1_700_000_000, Decimal::new(4200012, 2), Decimal::new(25, 2));
        MarketSnapshot {
            bids: vec![
                PriceLevel::new(Decimal::new(4200000, 2), Decimal::new(15, 1)),
                PriceLevel::new(Decimal::new(4199950, 2), Decimal::ONE),
            ],
            asks: vec![PriceLevel::new(Decimal::new(4200100, 2), Decimal::new(3, 1))],
            trades: vec![
                Trade::synthetic_sell(&trigger),
                Trade::real(&trigger, true, false),
                Trade::real(&MarketTrade::new(1_699_999_990, Decimal::new(4200010, 2), Decimal::ONE), false, true),
            ],
        }
    }

    #[test]
    fn test_render_lays_out_three_tables() {
        let lines = render("btcusd", &snapshot());

        // title + header + 2 book rows + title + header + 3 trades
        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains("BTCUSD"));
        assert!(lines[2].contains("42000.00") && lines[2].contains("42001.00"));
        assert!(lines[3].contains("41999.50"));
        assert!(!lines[3].contains("42001"));
    }

    #[test]
    fn test_trade_rows_carry_markers() {
        let lines = render("btcusd", &snapshot());
        let trades = &lines[6..];

        assert!(trades[0].trim_end().ends_with(OUR_TRADE));
        assert!(trades[0].contains("-1"));
        assert!(trades[1].contains(UPTICK));
        assert!(!trades[1].trim_end().ends_with(OUR_TRADE));
        assert!(trades[2].contains(DOWNTICK));
        assert!(trades[2].starts_with("22:13:10"));
    }

    #[test]
    fn test_empty_snapshot_renders_headers_only() {
        let lines = render("ethusd", &MarketSnapshot::default());
        assert_eq!(lines.len(), 4);
    }
}

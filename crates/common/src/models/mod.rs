pub mod orderbook;
pub mod trade;

pub use orderbook::{BookUpdate, PriceLevel, Side};
pub use trade::{MarketSnapshot, MarketTrade, Trade};

use async_trait::async_trait;

use common::error::FeedError;
use common::models::{BookUpdate, MarketTrade};

/// Wire payloads that convert into a domain model.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, FeedError>;
}

/// REST side of the exchange: the full book and the recent tape.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_order_book(&self) -> Result<BookUpdate, FeedError>;

    /// Up to `limit` most recent trades, newest first.
    async fn fetch_trades(&self, limit: usize) -> Result<Vec<MarketTrade>, FeedError>;
}

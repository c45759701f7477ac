use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use common::error::FeedError;
use common::models::{BookUpdate, MarketTrade};

use super::orderbook_response::DepthPayload;
use super::transactions_response::{TransactionEvent, to_trade_tape};
use crate::traits::{MarketSource, RemoteResponse};

/// REST client for one Bitstamp market.
#[derive(Clone)]
pub struct BitstampClient {
    client: Client,
    base_url: Url,
    market: String,
}

impl BitstampClient {
    pub fn new(base_url: &str, market: &str, timeout: Duration) -> Result<Self, FeedError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| FeedError::Config(format!("rest url {base_url:?}: {e}")))?;

        let client = Client::builder()
            .user_agent("bitstamp_book_watcher/0.1.0")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            market: market.to_lowercase(),
        })
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn order_book_url(&self) -> Result<Url, FeedError> {
        self.endpoint("order_book")
    }

    pub fn transactions_url(&self) -> Result<Url, FeedError> {
        self.endpoint("transactions")
    }

    fn endpoint(&self, resource: &str) -> Result<Url, FeedError> {
        self.base_url
            .join(&format!("{}/{}/", resource, self.market))
            .map_err(|e| FeedError::Config(format!("{resource} url: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FeedError> {
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            warn!(%url, %status, "bitstamp request rejected");
            return Err(FeedError::Transport(format!("HTTP {status}: {error_text}")));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str::<T>(&body)?)
    }
}

#[async_trait]
impl MarketSource for BitstampClient {
    #[instrument(skip(self), fields(market = %self.market), level = "debug")]
    async fn fetch_order_book(&self) -> Result<BookUpdate, FeedError> {
        let payload: DepthPayload = self.get_json(self.order_book_url()?).await?;
        let update = payload.to_model()?;

        debug!(
            bids = update.bids.len(),
            asks = update.asks.len(),
            "full order book fetched"
        );
        Ok(update)
    }

    #[instrument(skip(self), fields(market = %self.market), level = "debug")]
    async fn fetch_trades(&self, limit: usize) -> Result<Vec<MarketTrade>, FeedError> {
        let events: Vec<TransactionEvent> = self.get_json(self.transactions_url()?).await?;
        let tape = to_trade_tape(&events, limit)?;

        debug!(received = events.len(), kept = tape.len(), "trade tape fetched");
        Ok(tape)
    }
}

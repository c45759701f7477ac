use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::error::FeedError;
use common::models::BookUpdate;

use super::DepthPayload;
use crate::traits::RemoteResponse;

const DATA_EVENT: &str = "data";
const SUBSCRIBED_EVENT: &str = "bts:subscription_succeeded";
const RECONNECT_EVENT: &str = "bts:request_reconnect";

pub fn diff_channel(market: &str) -> String {
    format!("diff_order_book_{}", market.to_lowercase())
}

#[derive(Serialize, Debug)]
pub struct SubscribeRequest {
    event: &'static str,
    data: ChannelRef,
}

#[derive(Serialize, Debug)]
struct ChannelRef {
    channel: String,
}

impl SubscribeRequest {
    pub fn diff_order_book(market: &str) -> Self {
        Self {
            event: "bts:subscribe",
            data: ChannelRef {
                channel: diff_channel(market),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Deserialize)]
struct RawStreamEvent {
    event: String,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    data: Value, // parsed once the event kind is known
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Diff(BookUpdate),
    Subscribed(String),
    ReconnectRequested,
    Ignored(String),
}

pub fn parse_stream_message(text: &str) -> Result<StreamEvent, FeedError> {
    let raw: RawStreamEvent = serde_json::from_str(text)?;

    match raw.event.as_str() {
        DATA_EVENT => {
            let payload = serde_json::from_value::<DepthPayload>(raw.data)?;
            Ok(StreamEvent::Diff(payload.to_model()?))
        }
        SUBSCRIBED_EVENT => Ok(StreamEvent::Subscribed(raw.channel)),
        RECONNECT_EVENT => Ok(StreamEvent::ReconnectRequested),
        other => Ok(StreamEvent::Ignored(other.to_string())),
    }
}

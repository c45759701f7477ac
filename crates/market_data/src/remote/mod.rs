pub mod bitstamp_client;
pub mod orderbook_response;
pub mod stream_event;
pub mod transactions_response;

pub use bitstamp_client::BitstampClient;
pub use orderbook_response::DepthPayload;
pub use stream_event::{StreamEvent, SubscribeRequest, parse_stream_message};
pub use transactions_response::TransactionEvent;

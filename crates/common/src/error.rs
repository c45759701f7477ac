use std::time::Duration;

use thiserror::Error;

/// Failures raised around the order book feed.
///
/// Transport and parse failures are recoverable: callers log them and keep
/// the last known good state.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("first delta not received within {0:?}")]
    BarrierTimeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeedError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Transport(_) | Self::WebSocket(_)
        )
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Json(_) | Self::Parse(_))
    }
}

pub mod feed_coordinator;
pub mod market_gateway;
pub mod poll_service;

pub use feed_coordinator::{FeedCoordinator, FeedPhase};
pub use market_gateway::FeedGateway;
pub use poll_service::PollService;

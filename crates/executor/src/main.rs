use dotenvy::dotenv;
use rustls::crypto::ring::default_provider;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use common::actors::{Actor, ActorType};
use common::config::AppConfig;
use common::logger;
use common::models::MarketSnapshot;
use market_data::remote::BitstampClient;
use market_data::services::{FeedCoordinator, FeedGateway, PollService};
use strategy::StreakSignalEngine;

use crate::actors::supervisor::Supervisor;
use crate::services::console_presenter::ConsolePresenter;

mod actors;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    // reqwest and tokio-tungstenite both sit on rustls; pin the process-wide provider
    let _ = default_provider().install_default();

    let config = AppConfig::from_env()?;
    info!(
        market = %config.principal_market,
        depth = config.depth,
        upticks_to_sell = config.upticks_to_sell,
        downticks_to_buy = config.downticks_to_buy,
        poll_every = ?config.poll_interval,
        "Configuration loaded"
    );

    let client = BitstampClient::new(&config.rest_url, &config.principal_market, config.http_timeout)?;
    let engine = StreakSignalEngine::new(config.upticks_to_sell, config.downticks_to_buy);
    let coordinator = Arc::new(
        FeedCoordinator::new(Arc::new(client), engine)
            .with_first_delta_timeout(config.first_delta_timeout),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<MarketSnapshot>(16);

    let mut supervisor = Supervisor::new(shutdown_rx.clone());

    let feed_for_gateway = coordinator.clone();
    let ws_url = config.ws_url.clone();
    let market = config.principal_market.clone();
    supervisor.register_actor(
        ActorType::FeedGatewayActor,
        Box::new(move || -> Box<dyn Actor> {
            Box::new(FeedGateway::new(&ws_url, &market, feed_for_gateway.clone()))
        }),
    );

    let feed_for_poll = coordinator.clone();
    let depth = config.depth;
    let poll_interval = config.poll_interval;
    supervisor.register_actor(
        ActorType::PollActor,
        Box::new(move || -> Box<dyn Actor> {
            Box::new(PollService::new(
                feed_for_poll.clone(),
                depth,
                poll_interval,
                snapshot_tx.clone(),
            ))
        }),
    );

    let presenter = ConsolePresenter::new(&config.principal_market, snapshot_rx);
    let presenter_handle = tokio::spawn(presenter.run(shutdown_rx));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl-C: {}. Running until killed.", e);
                // dropping the sender would read as a shutdown request
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    supervisor.start().await;
    let _ = presenter_handle.await;

    info!("System stopped.");
    Ok(())
}

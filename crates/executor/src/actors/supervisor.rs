use std::{collections::HashMap, time::Duration};
use tracing::{debug, error, info, warn};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage, ShutdownSignal, shutdown_requested};

pub type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

const CHECK_EVERY: Duration = Duration::from_secs(1);
const UNRESPONSIVE_AFTER: Duration = Duration::from_secs(3);
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Spawns every registered actor, restarts the ones whose heartbeat goes
/// quiet, and waits for all of them once the shutdown signal is raised.
pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    // current incarnation of each actor; heartbeats from replaced ones are ignored
    live_ids: HashMap<Uuid, ActorType>,
    shutdown: ShutdownSignal,
}

impl Supervisor {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self {
            actor_factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            live_ids: HashMap::new(),
            shutdown,
        }
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let mut check_interval = time::interval(CHECK_EVERY);
        let mut shutdown = self.shutdown.clone();

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        actors.into_iter().for_each(|actor| {
            self.spawn_actor(actor, supervisor_tx.clone());
        });

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown requested, stopping actors.");
                    break;
                }

                Some(msg) = supervisor_rx.recv() => self.handle_message(msg),

                _ = check_interval.tick() => {
                    let dead_timeout = Instant::now() - UNRESPONSIVE_AFTER;

                    let dead_actors: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|(_, last)| **last < dead_timeout)
                        .map(|(actor, _)| *actor)
                        .collect();

                    for actor in dead_actors {
                        warn!("{:?} is unresponsive, restarting.", actor);
                        if let Some(handle) = self.handles.remove(&actor) {
                            handle.abort();
                        }
                        self.spawn_actor(actor, supervisor_tx.clone());
                    }
                }
            }
        }

        self.stop_all().await;
    }

    fn handle_message(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::Heartbeat(id) => {
                if let Some(actor) = self.live_ids.get(&id) {
                    self.pulses.insert(*actor, Instant::now());
                }
            }
            ControlMessage::Shutdown(id) => {
                if let Some(actor) = self.live_ids.remove(&id) {
                    warn!("{:?} is shutting down gracefully.", actor);
                    self.pulses.remove(&actor);
                    self.handles.remove(&actor);
                }
            }
            ControlMessage::Error(id, error_msg) => match self.live_ids.get(&id) {
                Some(actor) => {
                    error!("Actor {:?} reported error: {}", actor, error_msg);
                    self.pulses.insert(*actor, Instant::now());
                }
                None => debug!(%id, "error from a replaced actor: {}", error_msg),
            },
        }
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let Some(factory) = self.actor_factories.get(&actor_type) else {
            error!("No factory registered for {:?}", actor_type);
            return;
        };

        let mut new_actor = factory();
        let id = new_actor.id();
        let shutdown = self.shutdown.clone();

        let new_actor_handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx, shutdown).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });

        self.live_ids.retain(|_, actor| *actor != actor_type);
        self.live_ids.insert(id, actor_type);
        self.handles.insert(actor_type, new_actor_handle);
        self.pulses.insert(actor_type, Instant::now());
    }

    async fn stop_all(&mut self) {
        for (actor, handle) in self.handles.drain() {
            let abort = handle.abort_handle();
            match time::timeout(STOP_GRACE, handle).await {
                Ok(_) => debug!("{:?} stopped.", actor),
                Err(_) => {
                    warn!("{:?} did not stop within {:?}, aborting.", actor, STOP_GRACE);
                    abort.abort();
                }
            }
        }
        self.pulses.clear();
        self.live_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::watch;

    /// Runs until shutdown, heartbeating only when `healthy`.
    struct Probe {
        id: Uuid,
        healthy: bool,
        starts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Actor for Probe {
        fn name(&self) -> ActorType {
            ActorType::PollActor
        }

        fn id(&self) -> Uuid {
            self.id
        }

        async fn run(
            &mut self,
            supervisor_tx: mpsc::Sender<ControlMessage>,
            mut shutdown: ShutdownSignal,
        ) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let heartbeat = self.healthy.then(|| self.spawn_heartbeat(supervisor_tx.clone()));

            shutdown_requested(&mut shutdown).await;

            if let Some(handle) = heartbeat {
                handle.abort();
            }
            let _ = supervisor_tx.send(ControlMessage::Shutdown(self.id)).await;
            Ok(())
        }
    }

    fn probe_factory(healthy: bool, starts: Arc<AtomicUsize>) -> ActorFactory {
        Box::new(move || -> Box<dyn Actor> {
            Box::new(Probe {
                id: Uuid::new_v4(),
                healthy,
                starts: starts.clone(),
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_actor_is_restarted() {
        let starts = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut supervisor = Supervisor::new(shutdown_rx);
        supervisor.register_actor(ActorType::PollActor, probe_factory(false, starts.clone()));

        let running = tokio::spawn(async move { supervisor.start().await });

        time::sleep(Duration::from_secs(10)).await;
        assert!(starts.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(true).unwrap();
        running.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_actor_runs_once_and_stops_on_shutdown() {
        let starts = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut supervisor = Supervisor::new(shutdown_rx);
        supervisor.register_actor(ActorType::PollActor, probe_factory(true, starts.clone()));

        let running = tokio::spawn(async move { supervisor.start().await });

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        shutdown_tx.send(true).unwrap();
        time::timeout(Duration::from_secs(1), running)
            .await
            .expect("supervisor should return after shutdown")
            .unwrap();
    }
}

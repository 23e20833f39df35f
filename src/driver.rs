//! Ordered event loop tying the session to its connection.
//!
//! Intents, connection events and timers all go through one queue and are
//! dispatched one at a time. A dispatch, including the sends it causes,
//! completes before the next event is taken.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, TaggedEvent};
use crate::games::tictactoe::Position;
use crate::protocol;
use crate::session::{Command, Intent, NameEntry, Session, SessionEvent, SessionSnapshot};

/// An item of the driver's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// From the connection manager.
    Connection(TaggedEvent),
    /// From the user.
    Intent(Intent),
    /// Rematch delay elapsed.
    RematchTimerElapsed,
    /// Close everything and stop the loop.
    Shutdown,
}

impl From<TaggedEvent> for DriverEvent {
    fn from(event: TaggedEvent) -> Self {
        DriverEvent::Connection(event)
    }
}

/// Presentation-side handle: intents in, snapshots out.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    events: mpsc::UnboundedSender<DriverEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl ClientHandle {
    /// "Play online" with the result of the name prompt.
    pub fn request_play(&self, entry: NameEntry) {
        self.send(Intent::RequestPlay(entry));
    }

    /// Square clicked.
    pub fn submit_move(&self, pos: Position) {
        self.send(Intent::SubmitMove(pos));
    }

    /// "Play again" with the result of the name prompt.
    pub fn request_rematch(&self, entry: NameEntry) {
        self.send(Intent::RequestRematch(entry));
    }

    /// Cancel matchmaking, leave the match, or return to the menu.
    pub fn leave(&self) {
        self.send(Intent::Leave);
    }

    /// Stops the driver after closing the connection.
    pub fn shutdown(&self) {
        let _ = self.events.send(DriverEvent::Shutdown);
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Queues any intent.
    pub fn send(&self, intent: Intent) {
        if self.events.send(DriverEvent::Intent(intent)).is_err() {
            warn!("Session driver has stopped; intent dropped");
        }
    }
}

/// Owns the session, the connection and the event queue.
#[derive(Debug)]
pub struct SessionDriver {
    session: Session,
    connection: ConnectionManager<DriverEvent>,
    endpoint: String,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: mpsc::UnboundedReceiver<DriverEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    /// Creates a driver and the handle used to talk to it.
    #[instrument(skip(config), fields(endpoint = %config.endpoint()))]
    pub fn new(config: &ClientConfig) -> (Self, ClientHandle) {
        let session = Session::new(config.rematch_policy());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(session.snapshot());
        let handle = ClientHandle {
            events: events_tx.clone(),
            snapshots: snapshot_rx,
        };
        let driver = Self {
            session,
            connection: ConnectionManager::new(events_tx.clone()),
            endpoint: config.endpoint().clone(),
            events_tx,
            events_rx,
            snapshots,
        };
        (driver, handle)
    }

    /// Creates a driver and runs it on a new task.
    pub fn spawn(config: &ClientConfig) -> (ClientHandle, JoinHandle<()>) {
        let (driver, handle) = Self::new(config);
        (handle, tokio::spawn(driver.run()))
    }

    /// Consumes the queue until shutdown.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Session driver started");
        while let Some(event) = self.events_rx.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        info!("Session driver stopped");
    }

    /// Dispatches one queue item. Returns `false` on shutdown.
    fn handle(&mut self, event: DriverEvent) -> bool {
        let event = match event {
            DriverEvent::Connection(tagged) => match self.connection.accept(tagged) {
                Some(event) => SessionEvent::Connection(event),
                None => return true,
            },
            DriverEvent::Intent(intent) => SessionEvent::Intent(intent),
            DriverEvent::RematchTimerElapsed => SessionEvent::RematchTimerElapsed,
            DriverEvent::Shutdown => {
                self.session.dispatch(SessionEvent::Intent(Intent::Leave));
                self.connection.close();
                self.publish();
                return false;
            }
        };

        for command in self.session.dispatch(event) {
            self.execute(command);
        }
        self.publish();
        true
    }

    fn execute(&mut self, command: Command) {
        debug!(?command, "Executing command");
        match command {
            Command::Open => {
                self.connection.open(&self.endpoint);
            }
            Command::Send(message) => {
                let kind = message.kind();
                if let Err(e) = self.connection.send(protocol::encode(&message)) {
                    warn!(kind, error = %e, "Message dropped");
                }
            }
            Command::Close => self.connection.close(),
            Command::ScheduleRematchRequest(delay) => {
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(DriverEvent::RematchTimerElapsed);
                });
            }
        }
    }

    /// Publishes the snapshot only if it changed.
    fn publish(&self) {
        let next = self.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

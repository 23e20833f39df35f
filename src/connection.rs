//! Persistent connection to the game authority.
//!
//! [`ConnectionManager`] owns the single live WebSocket. Each connection runs
//! in its own task, reporting lifecycle and inbound frames into the caller's
//! event queue tagged with the handle that produced them. Events from a
//! superseded handle are discarded by [`ConnectionManager::accept`], so
//! exactly one connection can ever influence the session.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConnectionError, SendError};
use crate::session::ConnectionEvent;

/// Identifies one opened connection.
pub type HandleId = u64;

/// A connection event together with the handle that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    /// Producing connection.
    pub handle: HandleId,
    /// What happened.
    pub event: ConnectionEvent,
}

#[derive(Debug)]
struct ActiveConnection {
    id: HandleId,
    open: bool,
    outbound: mpsc::UnboundedSender<Message>,
}

/// Owns the one live connection of a session.
///
/// `E` is the event queue's item type; connection events are converted into
/// it so they interleave with everything else in arrival order.
#[derive(Debug)]
pub struct ConnectionManager<E> {
    events: mpsc::UnboundedSender<E>,
    active: Option<ActiveConnection>,
    next_id: HandleId,
}

impl<E> ConnectionManager<E>
where
    E: From<TaggedEvent> + Send + 'static,
{
    /// Creates a manager reporting into `events`.
    pub fn new(events: mpsc::UnboundedSender<E>) -> Self {
        Self {
            events,
            active: None,
            next_id: 1,
        }
    }

    /// Starts connecting to `endpoint`. Closes any existing connection first.
    ///
    /// Returns immediately; the outcome arrives later as
    /// [`ConnectionEvent::Opened`] or [`ConnectionEvent::Error`].
    #[instrument(skip(self))]
    pub fn open(&mut self, endpoint: &str) -> HandleId {
        if self.active.is_some() {
            info!("Closing previous connection before opening a new one");
            self.close();
        }
        let id = self.next_id;
        self.next_id += 1;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.active = Some(ActiveConnection {
            id,
            open: false,
            outbound: outbound_tx,
        });

        info!(handle = id, "Opening connection");
        tokio::spawn(run_connection(
            id,
            endpoint.to_string(),
            self.events.clone(),
            outbound_rx,
        ));
        id
    }

    /// Queues one text frame. Best-effort: no delivery guarantee.
    pub fn send(&self, frame: String) -> Result<(), SendError> {
        match &self.active {
            Some(active) if active.open => active
                .outbound
                .send(Message::text(frame))
                .map_err(|_| SendError::NotOpen),
            _ => Err(SendError::NotOpen),
        }
    }

    /// Closes the live connection, if any. Its later events are discarded.
    #[instrument(skip(self))]
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            // Dropping the outbound sender makes the task send a close frame.
            info!(handle = active.id, "Closing connection");
        }
    }

    /// Whether the live connection has reported open.
    pub fn is_open(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.open)
    }

    /// Handle of the live connection, if any.
    pub fn active_handle(&self) -> Option<HandleId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Filters an event from the queue.
    ///
    /// Returns `None` for events of a superseded handle. Tracks open/closed
    /// state for the live one.
    pub fn accept(&mut self, tagged: TaggedEvent) -> Option<ConnectionEvent> {
        let live = self.active.as_ref().map(|a| a.id);
        if live != Some(tagged.handle) {
            debug!(handle = tagged.handle, ?live, "Dropping event from superseded connection");
            return None;
        }
        match &tagged.event {
            ConnectionEvent::Opened => {
                if let Some(active) = self.active.as_mut() {
                    active.open = true;
                }
            }
            ConnectionEvent::Closed { .. } => self.active = None,
            ConnectionEvent::Message(_) | ConnectionEvent::Error(_) => {}
        }
        Some(tagged.event)
    }
}

/// Drives one connection until it closes.
#[instrument(skip(events, outbound))]
async fn run_connection<E>(
    id: HandleId,
    endpoint: String,
    events: mpsc::UnboundedSender<E>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) where
    E: From<TaggedEvent>,
{
    let emit = |event: ConnectionEvent| {
        // The queue only closes when the session is gone.
        let _ = events.send(E::from(TaggedEvent { handle: id, event }));
    };

    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let err = ConnectionError::from(e);
            warn!(error = %err, "Connection failed");
            emit(ConnectionEvent::Error(err.message));
            emit(ConnectionEvent::Closed { was_clean: false });
            return;
        }
    };
    info!("Connection established");
    emit(ConnectionEvent::Opened);

    let (mut sink, mut incoming) = stream.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(frame).await {
                        let err = ConnectionError::from(e);
                        warn!(error = %err, "Send failed");
                        emit(ConnectionEvent::Error(err.message));
                        emit(ConnectionEvent::Closed { was_clean: false });
                        return;
                    }
                }
                None => {
                    debug!("Manager released the connection; closing");
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    emit(ConnectionEvent::Closed { was_clean: true });
                    return;
                }
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    emit(ConnectionEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Authority closed the connection");
                    emit(ConnectionEvent::Closed { was_clean: true });
                    return;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    warn!(len = bytes.len(), "Ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let err = ConnectionError::from(e);
                    warn!(error = %err, "Transport error");
                    emit(ConnectionEvent::Error(err.message));
                    emit(ConnectionEvent::Closed { was_clean: false });
                    return;
                }
                None => {
                    emit(ConnectionEvent::Closed { was_clean: false });
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_connection_is_not_open() {
        let (tx, _rx) = mpsc::unbounded_channel::<TaggedEvent>();
        let manager = ConnectionManager::new(tx);
        assert_eq!(manager.send("{}".to_string()), Err(SendError::NotOpen));
        assert!(!manager.is_open());
    }

    #[tokio::test]
    async fn test_failed_open_reports_error_then_close() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TaggedEvent>();
        let mut manager = ConnectionManager::new(tx);
        // Port 1 is never listening.
        let handle = manager.open("ws://127.0.0.1:1/ws");

        let first = rx.recv().await.expect("event");
        assert_eq!(first.handle, handle);
        assert!(matches!(
            manager.accept(first),
            Some(ConnectionEvent::Error(_))
        ));
        let second = rx.recv().await.expect("event");
        assert_eq!(
            manager.accept(second),
            Some(ConnectionEvent::Closed { was_clean: false })
        );
        assert_eq!(manager.active_handle(), None);
    }

    #[tokio::test]
    async fn test_reopen_discards_events_of_first_handle() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TaggedEvent>();
        let mut manager = ConnectionManager::new(tx);
        let first = manager.open("ws://127.0.0.1:1/ws");
        let second = manager.open("ws://127.0.0.1:1/ws");
        assert_ne!(first, second);
        assert_eq!(manager.active_handle(), Some(second));

        let mut accepted = Vec::new();
        while accepted.len() < 2 {
            let tagged = rx.recv().await.expect("event");
            if let Some(event) = manager.accept(tagged.clone()) {
                assert_eq!(tagged.handle, second);
                accepted.push(event);
            }
        }
        assert_eq!(accepted[1], ConnectionEvent::Closed { was_clean: false });
    }
}

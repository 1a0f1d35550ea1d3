//! One task per room.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use crate::error::RoomError;
use crate::game::ConnectionId;
use crate::protocol::{ClientCommand, Envelope};
use crate::room::{Room, RoomId, TickOutcome};
use crate::server::RoomRegistry;

/// Input to a room task.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomMessage {
    /// A decoded client command.
    Command {
        /// Sender.
        connection: ConnectionId,
        /// Payload.
        command: ClientCommand,
    },
    /// The transport lost a connection.
    Disconnect {
        /// Lost connection.
        connection: ConnectionId,
    },
    /// Stop the task.
    Shutdown,
}

/// Cloneable address of a running room task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    tx: UnboundedSender<RoomMessage>,
}

impl RoomHandle {
    /// The room this handle reaches.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Forward a client command.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Closed`] if the task has stopped.
    pub fn send(&self, connection: ConnectionId, command: ClientCommand) -> Result<(), RoomError> {
        self.deliver(RoomMessage::Command {
            connection,
            command,
        })
    }

    /// Report a dropped connection.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Closed`] if the task has stopped.
    pub fn disconnect(&self, connection: ConnectionId) -> Result<(), RoomError> {
        self.deliver(RoomMessage::Disconnect { connection })
    }

    /// Ask the task to stop.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Closed`] if the task has already stopped.
    pub fn shutdown(&self) -> Result<(), RoomError> {
        self.deliver(RoomMessage::Shutdown)
    }

    /// Whether the task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn deliver(&self, message: RoomMessage) -> Result<(), RoomError> {
        self.tx
            .send(message)
            .map_err(|_| RoomError::Closed(self.id.to_string()))
    }
}

/// Owns a [`Room`] and drives its timer.
///
/// The tick interval exists only while a game runs: it is created when a
/// command starts the game and dropped when a tick ends it or the task
/// stops.
#[derive(Debug)]
pub struct RoomActor {
    room: Room,
    rx: UnboundedReceiver<RoomMessage>,
    out: UnboundedSender<Envelope>,
    registry: Option<RoomRegistry>,
    ticker: Option<Interval>,
}

impl RoomActor {
    /// Wrap `room`, sending its events to `out`.
    #[must_use]
    pub fn new(room: Room, out: UnboundedSender<Envelope>) -> (Self, RoomHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RoomHandle {
            id: room.id().clone(),
            tx,
        };
        let actor = Self {
            room,
            rx,
            out,
            registry: None,
            ticker: None,
        };
        (actor, handle)
    }

    /// Keep `registry` informed and deregister on exit.
    #[must_use]
    pub fn with_registry(mut self, registry: RoomRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Process messages and ticks until shutdown, every handle dropping,
    /// or the room emptying. Returns the room for inspection.
    ///
    /// The room leaves the registry however the task ends, including a
    /// panic or the runtime dropping it.
    pub async fn run(mut self) -> Room {
        info!(room = %self.room.id(), name = %self.room.room_name(), "room opened");
        let _registration = Registration {
            registry: self.registry.clone(),
            id: self.room.id().clone(),
        };

        loop {
            tokio::select! {
                message = self.rx.recv() => match message {
                    Some(RoomMessage::Command { connection, command }) => {
                        self.room.handle_command(connection, command, &mut self.out);
                    }
                    Some(RoomMessage::Disconnect { connection }) => {
                        if let Err(err) = self.room.leave(connection, &mut self.out) {
                            debug!(room = %self.room.id(), %connection, %err, "disconnect ignored");
                        }
                    }
                    Some(RoomMessage::Shutdown) | None => break,
                },
                () = next_tick(&mut self.ticker) => self.on_tick(),
            }

            self.sync_ticker();
            if let Some(registry) = &self.registry {
                registry.update(&self.room);
            }
            if self.room.is_abandoned() {
                debug!(room = %self.room.id(), "room is empty");
                break;
            }
        }

        self.ticker = None;
        info!(room = %self.room.id(), "room closed");
        self.room
    }

    fn on_tick(&mut self) {
        match self.room.tick(&mut self.out) {
            Ok(TickOutcome::Continue) => {}
            Ok(TickOutcome::Ended { replay_id }) => {
                debug!(room = %self.room.id(), replay = ?replay_id, "stopping ticker");
                self.ticker = None;
            }
            Err(err) => error!(room = %self.room.id(), %err, "tick failed"),
        }
    }

    /// Start or stop the interval to match the room state.
    fn sync_ticker(&mut self) {
        match (self.room.game_started(), self.ticker.is_some()) {
            (true, false) => {
                let period = self.room.config().tick_interval();
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                debug!(room = %self.room.id(), ?period, "starting ticker");
                self.ticker = Some(ticker);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }
    }
}

/// Removes a room from its registry when dropped.
struct Registration {
    registry: Option<RoomRegistry>,
    id: RoomId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            registry.remove(&self.id);
        }
    }
}

/// Wait for the next tick, or forever without a ticker.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

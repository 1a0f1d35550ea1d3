//! Messages exchanged with clients.
//!
//! The transport is not part of this crate. It decodes inbound JSON into
//! [`ClientCommand`]s tagged with the sending [`ConnectionId`], and
//! delivers each outbound [`Envelope`] either to one connection or to every
//! connection in a room.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::diff::DiffEntry;
use crate::game::{ConnectionId, PlayerId, PlayerSummary, Point};
use crate::room::{LeaderboardEntry, RoomConfig, RoomId, Setting};

/// A request from one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Enter the room as a new player.
    Join {
        /// Display name.
        username: String,
    },
    /// Resume a player record after losing the connection.
    Reconnect {
        /// Identifier handed out by `SetPlayer`.
        player_id: PlayerId,
        /// Name used if the record no longer exists.
        username: String,
    },
    /// Ask for a room snapshot.
    GetRoomInfo,
    /// Change one room setting (host only).
    ChangeSetting(Setting),
    /// Hand host rights to another player (host only).
    ChangeHost {
        /// New host.
        player_id: PlayerId,
    },
    /// Switch team, or spectate with the spectator team.
    ChangeTeam {
        /// Team number.
        team: u8,
    },
    /// Toggle the ready vote.
    ForceStart,
    /// Move units from one owned tile.
    Attack {
        /// Origin.
        from: Point,
        /// Destination.
        to: Point,
        /// Send half instead of all.
        #[serde(default)]
        half: bool,
    },
    /// Give up the current game.
    Surrender,
    /// Chat.
    PlayerMessage {
        /// Message body.
        text: String,
    },
    /// Leave the room.
    Leave,
}

/// Room state as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Room identifier.
    pub id: RoomId,
    /// Display name.
    pub room_name: String,
    /// Whether a game is running.
    pub game_started: bool,
    /// Current ready votes.
    pub force_start_num: usize,
    /// Settings.
    pub config: RoomConfig,
    /// Roster in color order.
    pub players: Vec<PlayerSummary>,
}

/// What a player needs to set up their board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitInfo {
    /// The receiving player's king, `None` for spectators.
    pub king: Option<Point>,
    /// Map width.
    pub map_width: u16,
    /// Map height.
    pub map_height: u16,
    /// Everyone taking part.
    pub players: Vec<PlayerSummary>,
}

/// An event sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Identity assigned to this connection.
    SetPlayer {
        /// Player id to use for reconnects.
        player_id: PlayerId,
    },
    /// Room state changed.
    UpdateRoom(RoomSnapshot),
    /// Chat message.
    RoomMessage {
        /// Author.
        sender: PlayerSummary,
        /// Body.
        text: String,
    },
    /// A game began.
    GameStarted(InitInfo),
    /// Per-turn board update for one viewer.
    GameUpdate {
        /// Patch against the previous update.
        diff: Vec<DiffEntry>,
        /// Turn the update describes.
        turn: u32,
        /// Standings.
        leaderboard: Vec<LeaderboardEntry>,
    },
    /// A king was taken.
    Captured {
        /// New owner of the king tile.
        capturer: PlayerSummary,
        /// Eliminated player.
        victim: PlayerSummary,
    },
    /// You were eliminated.
    GameOver {
        /// Who took your king.
        capturer: PlayerSummary,
    },
    /// The game finished.
    GameEnded {
        /// Members of the last team standing.
        winners: Vec<PlayerSummary>,
        /// Stored replay, if saving succeeded.
        replay_id: Option<String>,
    },
    /// Join refused.
    RejectJoin {
        /// Human-readable reason.
        reason: String,
    },
    /// Attack accepted.
    AttackSuccess {
        /// Origin.
        from: Point,
        /// Destination.
        to: Point,
    },
    /// Attack refused.
    AttackFailure {
        /// Origin.
        from: Point,
        /// Destination.
        to: Point,
        /// Human-readable reason.
        reason: String,
    },
    /// Ready vote count changed.
    ForceStartChanged {
        /// Votes cast.
        count: usize,
        /// Votes needed.
        required: usize,
    },
    /// A player gave up or idled out.
    Surrendered {
        /// Who.
        player: PlayerSummary,
    },
    /// A player dropped during a game.
    PlayerDisconnected {
        /// Who.
        player: PlayerSummary,
    },
    /// A command failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Delivery address of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single connection.
    Connection(ConnectionId),
    /// Every connection in the room.
    Room(RoomId),
}

/// An addressed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Recipient.
    pub target: Target,
    /// Payload.
    pub event: ServerEvent,
}

/// Outbound side of the transport.
pub trait Emitter {
    /// Queue one event for delivery.
    fn emit(&mut self, envelope: Envelope);

    /// Send to a single connection.
    fn to_connection(&mut self, connection: ConnectionId, event: ServerEvent) {
        self.emit(Envelope {
            target: Target::Connection(connection),
            event,
        });
    }

    /// Send to every connection in a room.
    fn to_room(&mut self, room: &RoomId, event: ServerEvent) {
        self.emit(Envelope {
            target: Target::Room(room.clone()),
            event,
        });
    }
}

impl Emitter for Vec<Envelope> {
    fn emit(&mut self, envelope: Envelope) {
        self.push(envelope);
    }
}

/// Emitter that discards everything, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmitter;

impl Emitter for NullEmitter {
    fn emit(&mut self, _envelope: Envelope) {}
}

impl Emitter for UnboundedSender<Envelope> {
    fn emit(&mut self, envelope: Envelope) {
        if self.send(envelope).is_err() {
            trace!("outbound channel closed, dropping event");
        }
    }
}

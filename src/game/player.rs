//! Player state management.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::MapDiff;
use crate::game::Point;

/// Highest selectable team number. Teams are `1..=MAX_TEAM_NUM`.
pub const MAX_TEAM_NUM: u8 = 16;

/// Team number reserved for spectators.
pub const SPECTATOR_TEAM: u8 = MAX_TEAM_NUM + 1;

/// Unique identifier for a player, stable across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Create a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Transport-level identifier of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// State for a single participant in a room.
///
/// The `land` set mirrors block ownership on the active map: a block's
/// owner is `Some(id)` exactly when its point is in that player's `land`.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Connection currently bound to this player.
    pub connection: ConnectionId,
    /// Display name.
    pub username: String,
    /// Color index, equal to the player's position in the room roster.
    pub color: u8,
    /// Team number, or [`SPECTATOR_TEAM`].
    pub team: u8,
    /// Whether this player may change room settings.
    pub is_room_host: bool,
    /// Ready vote for starting before the room is full.
    pub force_start: bool,
    /// Eliminated (or surrendered) in the current game.
    pub is_dead: bool,
    /// Lost the connection while a game was running.
    pub disconnected: bool,
    /// Last turn at which an order from this player was accepted.
    pub operated_turn: u32,
    /// Points of every block this player owns.
    pub land: BTreeSet<Point>,
    /// Location of this player's king, while they have one.
    pub king: Option<Point>,
    /// Encoder state for this player's fogged view.
    pub last_sent_view: MapDiff,
}

impl Player {
    /// Create a player that just joined a room.
    #[must_use]
    pub fn new(id: PlayerId, connection: ConnectionId, username: String, color: u8, team: u8) -> Self {
        Self {
            id,
            connection,
            username,
            color,
            team,
            is_room_host: false,
            force_start: false,
            is_dead: false,
            disconnected: false,
            operated_turn: 0,
            land: BTreeSet::new(),
            king: None,
            last_sent_view: MapDiff::new(),
        }
    }

    /// Whether this player watches instead of playing.
    #[must_use]
    pub const fn is_spectator(&self) -> bool {
        self.team == SPECTATOR_TEAM
    }

    /// Still competing: not dead and not spectating.
    #[must_use]
    pub const fn is_contender(&self) -> bool {
        !self.is_dead && !self.is_spectator()
    }

    /// Clear per-game state, keeping identity, team, and connection.
    pub fn reset(&mut self) {
        self.force_start = false;
        self.is_dead = false;
        self.disconnected = false;
        self.operated_turn = 0;
        self.land.clear();
        self.king = None;
        self.last_sent_view = MapDiff::new();
    }

    /// Public roster entry for this player.
    #[must_use]
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            username: self.username.clone(),
            color: self.color,
            team: self.team,
            is_room_host: self.is_room_host,
            force_start: self.force_start,
            is_dead: self.is_dead,
        }
    }
}

/// Minified player identity sent to clients and stored in replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub username: String,
    /// Color index.
    pub color: u8,
    /// Team number.
    pub team: u8,
    /// Room host flag.
    pub is_room_host: bool,
    /// Ready vote.
    pub force_start: bool,
    /// Eliminated flag.
    pub is_dead: bool,
}

/// Find a player by id.
#[must_use]
pub fn find(players: &[Player], id: PlayerId) -> Option<&Player> {
    players.iter().find(|p| p.id == id)
}

/// Find a player by id, mutably.
#[must_use]
pub fn find_mut(players: &mut [Player], id: PlayerId) -> Option<&mut Player> {
    players.iter_mut().find(|p| p.id == id)
}

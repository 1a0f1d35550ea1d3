//! Rooms: roster, settings, and the lobby/game state machine.
//!
//! A room starts in the lobby. When enough players vote to force-start,
//! a map is generated and the room switches to in-progress; the scheduler
//! then calls [`Room::tick`] until one team is left, at which point the
//! replay is stored and the room returns to the lobby with its roster
//! reset.
//!
//! Every operation runs to completion on `&mut Room` and reports to
//! clients through an [`Emitter`]; the room never blocks.

mod config;
mod leaderboard;
mod lifecycle;
mod lobby;
mod tick;

pub use config::{
    ALLOWED_SPEEDS, BASE_TICK, MAX_MAP_BASE, MAX_PLAYERS, MAX_ROOM_NAME, MIN_MAP_SIDE, MIN_PLAYERS,
    RoomConfig, Setting, validate_room_name,
};
pub use leaderboard::{LeaderboardEntry, compute_leaderboard};
pub use lobby::{FORCE_START_OK, MAX_MESSAGE_LEN, MIN_PLAYERS_TO_START, required_votes};
pub use tick::{AFK_TURN_LIMIT, TickOutcome};

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::MapDiff;
use crate::error::RoomError;
use crate::game::{ConnectionId, CustomMap, GameMap, Player};
use crate::protocol::{ClientCommand, Emitter, RoomSnapshot, ServerEvent};
use crate::replay::{GameRecord, ReplayStore};

/// Identifier of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// A fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(uuid[..8].to_string())
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One room and, while a game runs, its map and recording.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    room_name: String,
    config: RoomConfig,
    keep_alive: bool,
    game_started: bool,
    force_start_num: usize,
    players: Vec<Player>,
    map: Option<GameMap>,
    record: Option<GameRecord>,
    replay_diff: MapDiff,
    custom_map: Option<CustomMap>,
    replays: Arc<dyn ReplayStore>,
    rng: StdRng,
}

impl Room {
    /// Create an empty room in the lobby state.
    #[must_use]
    pub fn new(id: RoomId, room_name: String, config: RoomConfig, replays: Arc<dyn ReplayStore>) -> Self {
        Self {
            id,
            room_name,
            config,
            keep_alive: false,
            game_started: false,
            force_start_num: 0,
            players: Vec::new(),
            map: None,
            record: None,
            replay_diff: MapDiff::new(),
            custom_map: None,
            replays,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for map generation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Keep the room registered even when it empties.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Play the next games on an authored map instead of a generated one.
    pub fn set_custom_map(&mut self, custom: Option<CustomMap>) {
        self.custom_map = custom;
    }

    /// Room identifier.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Whether the room survives being empty.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Whether a game is running.
    #[must_use]
    pub fn game_started(&self) -> bool {
        self.game_started
    }

    /// Ready votes from non-spectators.
    #[must_use]
    pub fn force_start_num(&self) -> usize {
        self.force_start_num
    }

    /// Roster in color order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The running game's map.
    #[must_use]
    pub fn map(&self) -> Option<&GameMap> {
        self.map.as_ref()
    }

    /// The running game's recording.
    #[must_use]
    pub fn record(&self) -> Option<&GameRecord> {
        self.record.as_ref()
    }

    /// No player records remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether the room should be torn down.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.is_empty() && !self.keep_alive
    }

    /// State as shown to clients.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            room_name: self.room_name.clone(),
            game_started: self.game_started,
            force_start_num: self.force_start_num,
            config: self.config,
            players: self.players.iter().map(Player::summary).collect(),
        }
    }

    /// Route one client command, reporting failures to the sender.
    pub fn handle_command(
        &mut self,
        connection: ConnectionId,
        command: ClientCommand,
        out: &mut dyn Emitter,
    ) {
        debug!(room = %self.id, %connection, ?command, "command");
        let result = match command {
            ClientCommand::Join { username } => self.join(connection, &username, out).map(drop),
            ClientCommand::Reconnect {
                player_id,
                username,
            } => self.reconnect(connection, player_id, &username, out).map(drop),
            ClientCommand::GetRoomInfo => {
                out.to_connection(connection, ServerEvent::UpdateRoom(self.snapshot()));
                Ok(())
            }
            ClientCommand::ChangeSetting(setting) => self.change_setting(connection, setting, out),
            ClientCommand::ChangeHost { player_id } => self.change_host(connection, player_id, out),
            ClientCommand::ChangeTeam { team } => self.change_team(connection, team, out),
            ClientCommand::ForceStart => self.toggle_force_start(connection, out),
            ClientCommand::Attack { from, to, half } => {
                self.handle_attack(connection, from, to, half, out);
                Ok(())
            }
            ClientCommand::Surrender => self.surrender(connection, out),
            ClientCommand::PlayerMessage { text } => self.chat(connection, &text, out),
            ClientCommand::Leave => self.leave(connection, out),
        };

        if let Err(err) = result {
            debug!(room = %self.id, %connection, %err, "command failed");
            let event = match err {
                RoomError::Join(reason) => ServerEvent::RejectJoin {
                    reason: reason.to_string(),
                },
                other => ServerEvent::Error {
                    message: other.to_string(),
                },
            };
            out.to_connection(connection, event);
        }
    }

    /// Index of the live player bound to `connection`.
    fn player_index(&self, connection: ConnectionId) -> Result<usize, RoomError> {
        self.players
            .iter()
            .position(|p| p.connection == connection && !p.disconnected)
            .ok_or(RoomError::NotInRoom)
    }

    fn broadcast_room(&self, out: &mut dyn Emitter) {
        out.to_room(&self.id, ServerEvent::UpdateRoom(self.snapshot()));
    }
}

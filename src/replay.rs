//! Game recording and replay.
//!
//! A [`GameRecord`] is the unfogged diff trace of one game: one
//! [`TurnRecord`] per tick, each holding the patch against the previous
//! tick's grid and that tick's leaderboard, plus the chat log. The first
//! recorded turn is always a full frame, so any turn can be rebuilt by
//! applying patches forward from the start (see [`ReplayCursor`]).
//!
//! Completed records are handed to a [`ReplayStore`] once, at game end.

mod cursor;
mod render;
mod store;

pub use cursor::ReplayCursor;
pub use render::render_snapshot;
pub use store::{FileReplayStore, MemoryReplayStore, ReplayStore, new_replay_id};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::DiffEntry;
use crate::error::ReplayError;
use crate::game::{PlayerId, PlayerSummary};
use crate::room::{LeaderboardEntry, RoomConfig};

/// One tick of a recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turn number.
    pub turn: u32,
    /// Patch against the previous recorded grid.
    pub diff: Vec<DiffEntry>,
    /// Standings at this turn.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Turn the message was sent on.
    pub turn: u32,
    /// Author.
    pub sender: PlayerId,
    /// Author's name at the time.
    pub username: String,
    /// Author's color.
    pub color: u8,
    /// Message body.
    pub content: String,
}

/// Everything needed to play a finished game back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Room the game was played in.
    pub room_name: String,
    /// Map name (`"random"` for generated maps).
    pub map_name: String,
    /// Map width.
    pub map_width: u16,
    /// Map height.
    pub map_height: u16,
    /// Settings in force.
    pub config: RoomConfig,
    /// Roster at game start.
    pub players: Vec<PlayerSummary>,
    /// Per-tick trace.
    pub turns: Vec<TurnRecord>,
    /// Chat log.
    pub messages: Vec<ChatRecord>,
    /// Last team standing, filled in at game end.
    #[serde(default)]
    pub winners: Vec<PlayerSummary>,
}

impl GameRecord {
    /// Start an empty record.
    #[must_use]
    pub fn new(
        room_name: String,
        map_name: String,
        map_width: u16,
        map_height: u16,
        config: RoomConfig,
        players: Vec<PlayerSummary>,
    ) -> Self {
        Self {
            room_name,
            map_name,
            map_width,
            map_height,
            config,
            players,
            turns: Vec::new(),
            messages: Vec::new(),
            winners: Vec::new(),
        }
    }

    /// Append one tick.
    pub fn push_turn(&mut self, turn: u32, diff: Vec<DiffEntry>, leaderboard: Vec<LeaderboardEntry>) {
        self.turns.push(TurnRecord {
            turn,
            diff,
            leaderboard,
        });
    }

    /// Append one chat line.
    pub fn push_message(&mut self, message: ChatRecord) {
        self.messages.push(message);
    }

    /// Last recorded turn, if any.
    #[must_use]
    pub fn last_turn(&self) -> Option<u32> {
        self.turns.last().map(|t| t.turn)
    }

    /// Chat lines sent up to and including `turn`.
    pub fn messages_until(&self, turn: u32) -> impl Iterator<Item = &ChatRecord> {
        self.messages.iter().take_while(move |m| m.turn <= turn)
    }

    /// Write the record as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] on I/O or encoding failure.
    pub fn save_file(&self, path: &Path) -> Result<(), ReplayError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a record written by [`GameRecord::save_file`].
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] on I/O or decoding failure.
    pub fn load_file(path: &Path) -> Result<Self, ReplayError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

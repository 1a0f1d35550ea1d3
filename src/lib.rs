// Allow unwrap and lossy casts in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation))]
//! Conquer: the authoritative server core of a real-time territory-conquest
//! game.
//!
//! Players own tiles on a grid, grow armies every few turns, and attack
//! neighbouring tiles until one team holds every king. This crate covers
//! everything between the socket and the game rules:
//! - Map generation with connectivity guarantees
//! - Per-player fog of war
//! - Combat, growth, and neutralization
//! - Run-length encoded board diffs
//! - The room lifecycle and its tick scheduler
//! - Replays
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Server (registry + room actors)   │
//! ├─────────────────────────────────────┤
//! │   Room (lobby, lifecycle, tick)     │
//! ├─────────────────────────────────────┤
//! │   Game (map, combat, visibility)    │
//! └─────────────────────────────────────┘
//! ```

pub mod diff;
pub mod error;
pub mod game;
pub mod protocol;
pub mod replay;
pub mod room;
pub mod server;
pub mod sim;

pub use diff::{DiffEntry, MapDiff, apply_diff};
pub use error::{
    AttackRejection, DiffError, GenerationError, JoinRejection, ReplayError, RoomError,
    SettingsError, TickError,
};

// Re-export key game types at crate root for convenience
pub use game::{
    Block, ConnectionId, GameMap, Player, PlayerId, Point, TileType, TileView, generate_map,
};
pub use protocol::{ClientCommand, Emitter, Envelope, NullEmitter, ServerEvent};
pub use replay::{FileReplayStore, GameRecord, MemoryReplayStore, ReplayStore};
pub use room::{Room, RoomConfig, RoomId, TickOutcome};
pub use server::{RoomActor, RoomHandle, RoomRegistry};
pub use sim::{GameSummary, SelfPlay, SimConfig};

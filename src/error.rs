//! Error types for the game server core.

use thiserror::Error;

use crate::game::Point;

/// Map generation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// A map side was zero.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// No valid king site was found for a player.
    #[error("could not place a king for {username} after {attempts} attempts")]
    KingPlacement {
        /// Player left without a king.
        username: String,
        /// Samples drawn before giving up.
        attempts: u32,
    },
    /// An authored map is malformed.
    #[error("invalid custom map: {0}")]
    InvalidCustomMap(String),
}

/// Why an attack order was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttackRejection {
    /// Origin or destination lies outside the map.
    #[error("{0} is out of bounds")]
    OutOfBounds(Point),
    /// The origin tile belongs to someone else.
    #[error("origin {0} is not owned by the player")]
    NotOwner(Point),
    /// Mountains cannot be entered.
    #[error("destination {0} is a mountain")]
    Mountain(Point),
    /// An order was already accepted this turn.
    #[error("an order was already accepted on turn {turn}")]
    RateLimited {
        /// Turn the player last operated on.
        turn: u32,
    },
    /// The player is not part of this game.
    #[error("unknown player")]
    UnknownPlayer,
}

/// Why a join request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinRejection {
    /// The roster is at `max_players`.
    #[error("room is full")]
    RoomFull,
    /// A game is running and the request is not a reconnect.
    #[error("game already started")]
    GameStarted,
    /// The connection already has a player in this room.
    #[error("already joined")]
    AlreadyJoined,
    /// Username was empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,
}

/// Invalid or unauthorized settings changes.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    /// Only the host may change settings.
    #[error("only the room host can change settings")]
    NotHost,
    /// Settings are frozen while a game is running.
    #[error("cannot change settings while a game is running")]
    GameInProgress,
    /// Speed not in the allowed set.
    #[error("unsupported game speed {0}")]
    InvalidSpeed(f64),
    /// A ratio outside its allowed range.
    #[error("{name} out of range: {value}")]
    InvalidRatio {
        /// Setting name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// `max_players` outside `[2, 16]` or below the current roster size.
    #[error("max players must be between {min} and 16, got {value}")]
    InvalidMaxPlayers {
        /// Lowest acceptable value.
        min: usize,
        /// Rejected value.
        value: usize,
    },
    /// Room name empty or too long.
    #[error("room name must be 1 to 32 characters")]
    InvalidRoomName,
    /// Team number outside `1..=MAX_TEAM_NUM + 1`.
    #[error("invalid team {0}")]
    InvalidTeam(u8),
    /// Target of a host transfer is not in the room.
    #[error("no such player")]
    UnknownPlayer,
}

/// Malformed diff input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiffError {
    /// A run or literal would write past the end of the grid.
    #[error("diff overruns previous grid of {len} cells at position {at}")]
    Overrun {
        /// Length of the grid being patched.
        len: usize,
        /// Position the overrunning entry started at.
        at: usize,
    },
    /// The diff covered fewer cells than the grid.
    #[error("diff covers {covered} of {len} cells")]
    Incomplete {
        /// Cells covered.
        covered: usize,
        /// Grid length.
        len: usize,
    },
    /// A run-length entry referenced a grid that does not exist yet.
    #[error("run-length entry without a previous grid")]
    MissingBase,
}

/// Replay storage and playback failures.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Filesystem error.
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding or decoding failed.
    #[error("replay json error: {0}")]
    Json(#[from] serde_json::Error),
    /// No replay with this id.
    #[error("replay {0} not found")]
    NotFound(String),
    /// Recorded diffs do not apply cleanly.
    #[error("corrupt replay: {0}")]
    Corrupt(#[from] DiffError),
    /// Requested turn is not recorded.
    #[error("turn {turn} not in replay (last turn {last})")]
    TurnOutOfRange {
        /// Requested turn.
        turn: u32,
        /// Last recorded turn.
        last: u32,
    },
}

/// Failures of a single scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// Tick fired while no game was running.
    #[error("no game in progress")]
    NoGame,
    /// Post-tick consistency checks failed.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Room-level failures surfaced to clients or the actor.
#[derive(Debug, Error)]
pub enum RoomError {
    /// Join refused.
    #[error(transparent)]
    Join(#[from] JoinRejection),
    /// Settings change refused.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Game could not start.
    #[error("game start failed: {0}")]
    Generation(#[from] GenerationError),
    /// Tick failure.
    #[error(transparent)]
    Tick(#[from] TickError),
    /// The connection has no player in this room.
    #[error("connection is not in this room")]
    NotInRoom,
    /// The command needs a running game.
    #[error("no game in progress")]
    NotStarted,
    /// The command is only valid in the lobby.
    #[error("game already started")]
    AlreadyStarted,
    /// Room actor is gone.
    #[error("room {0} is closed")]
    Closed(String),
}

//! Tile types and the per-cell block state.

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// Type of terrain on a tile.
///
/// `Fog` and `Obstacle` never appear on the authoritative grid; they only
/// occur in a [`TileView`] built for a player who cannot see the real cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileType {
    /// A player's home tile. Losing it eliminates the player.
    King = 0,
    /// Capturable fortified tile, grows when owned.
    City = 1,
    /// Ordinary open ground.
    Plain = 2,
    /// Impassable, never capturable.
    Mountain = 3,
    /// Open ground that drains its owner's units.
    Swamp = 4,
    /// Unknown cell (view only).
    Fog = 5,
    /// Silhouette of an unrevealed mountain or city (view only).
    Obstacle = 6,
}

impl TileType {
    /// Whether armies may be sent onto this tile.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, TileType::Mountain)
    }

    /// Whether this tile counts as an obstacle for map connectivity.
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(self, TileType::Mountain | TileType::City)
    }
}

/// A single cell of the authoritative grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Type of terrain.
    pub tile_type: TileType,
    /// Units stationed on this tile.
    pub unit: u32,
    /// Owner of this tile (`None` = neutral).
    pub owner: Option<PlayerId>,
    /// Visible to every player regardless of fog.
    pub always_revealed: bool,
    /// King assignment order for authored maps (lower first).
    pub priority: u8,
}

impl Block {
    /// Create an unowned block of the given type with no units.
    #[must_use]
    pub const fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            unit: 0,
            owner: None,
            always_revealed: false,
            priority: 0,
        }
    }

    /// Create a plain block.
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(TileType::Plain)
    }

    /// Create a neutral city garrisoned with `unit` units.
    #[must_use]
    pub const fn city(unit: u32) -> Self {
        Self {
            unit,
            ..Self::new(TileType::City)
        }
    }

    /// Drop ownership, keeping terrain and units.
    pub fn be_neutralized(&mut self) {
        self.owner = None;
    }

    /// Whether `player` owns this block.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::plain()
    }
}

/// What one viewer knows about a cell.
///
/// `color` and `unit` are `None` when the viewer does not know them, which
/// is distinct from "neutral" or "zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileView {
    /// Visible terrain.
    pub tile_type: TileType,
    /// Owner's color index, if known and owned.
    pub color: Option<u8>,
    /// Unit count, if known.
    pub unit: Option<u32>,
}

impl TileView {
    /// A completely unknown cell.
    pub const FOG: Self = Self {
        tile_type: TileType::Fog,
        color: None,
        unit: None,
    };

    /// The silhouette of an unrevealed mountain or city.
    pub const OBSTACLE: Self = Self {
        tile_type: TileType::Obstacle,
        color: None,
        unit: None,
    };

    /// The true state of a block, with its owner's color already resolved.
    #[must_use]
    pub const fn revealed(block: &Block, color: Option<u8>) -> Self {
        Self {
            tile_type: block.tile_type,
            color,
            unit: Some(block.unit),
        }
    }
}

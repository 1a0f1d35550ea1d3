//! Game layer.
//!
//! Implements the rules of a single match:
//! - Map grid with kings, cities, plains, mountains, and swamps
//! - Map generation with a connectivity guarantee
//! - Attack resolution and per-turn growth
//! - Fog of war
//! - Neutralization of eliminated players

mod block;
pub mod combat;
pub mod connectivity;
pub mod growth;
pub mod invariants;
mod map;
pub mod mapgen;
mod neutralize;
pub mod player;
mod point;
pub mod visibility;

pub use block::{Block, TileType, TileView};
pub use combat::{AttackOrder, AttackOutcome, attack};
pub use growth::{Totals, get_total, update_unit};
pub use map::GameMap;
pub use mapgen::{CustomMap, CustomTile, GenerationParams, generate_map, load_custom_map};
pub use neutralize::{neutralize, transfer_land};
pub use player::{ConnectionId, MAX_TEAM_NUM, Player, PlayerId, PlayerSummary, SPECTATOR_TEAM};
pub use point::Point;
pub use visibility::{full_view, view_for_player};

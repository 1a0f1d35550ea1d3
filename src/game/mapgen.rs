//! Map generation.
//!
//! Generated maps place kings first, then mountains and cities under a
//! connectivity check, then swamps. Authored maps go through
//! [`load_custom_map`], which assigns the authored kings by priority and
//! falls back to random placement for any players left without one.

// Terrain targets are computed in floating point from ratios
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::game::connectivity::is_connected;
use crate::game::{Block, GameMap, Player, Point, TileType};

/// Kings must be strictly farther apart than this (Manhattan).
pub const KING_MIN_DISTANCE: u32 = 6;

/// Random samples allowed per player when placing a king.
pub const KING_PLACEMENT_ATTEMPTS: u32 = 10;

/// Tries per mountain or city before giving up on that terrain kind.
pub const OBSTACLE_ATTEMPTS: u32 = 3;

/// Starting garrison of a neutral city.
pub const CITY_UNIT_RANGE: RangeInclusive<u32> = 35..=55;

/// Inputs for random map generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Map width in tiles.
    pub width: u16,
    /// Map height in tiles.
    pub height: u16,
    /// Mountain ratio in `[0, 1]`.
    pub mountain: f64,
    /// City ratio in `[0, 1]`.
    pub city: f64,
    /// Swamp ratio in `[0, 1]`.
    pub swamp: f64,
}

/// How many of each terrain kind generation aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainTargets {
    /// Mountains requested.
    pub mountains: u32,
    /// Cities requested.
    pub cities: u32,
    /// Swamps requested.
    pub swamps: u32,
}

impl TerrainTargets {
    /// Derive terrain counts from the map area and terrain ratios.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_ratios(area: usize, mountain: f64, city: f64, swamp: f64) -> Self {
        let area = area as f64;
        let (mountains, cities) = if mountain + city > 0.0 {
            let total = mountain + city;
            (
                ((area / 4.0) * mountain / total).ceil() as u32,
                ((area / 6.0) * city / total).ceil() as u32,
            )
        } else {
            (0, 0)
        };
        let open = (area - f64::from(mountains) - f64::from(cities)).max(0.0);
        let swamps = ((open / 3.0) * swamp).ceil() as u32;

        Self {
            mountains,
            cities,
            swamps,
        }
    }
}

/// Generate a random map and place a king for every contender.
///
/// # Errors
///
/// Returns [`GenerationError::KingPlacement`] if a king cannot be placed
/// within [`KING_PLACEMENT_ATTEMPTS`] samples, or
/// [`GenerationError::InvalidDimensions`] for an empty map.
pub fn generate_map<R: Rng + ?Sized>(
    params: &GenerationParams,
    players: &mut [Player],
    rng: &mut R,
) -> Result<GameMap, GenerationError> {
    let mut map = GameMap::new(params.width, params.height)?;
    let targets =
        TerrainTargets::from_ratios(map.area(), params.mountain, params.city, params.swamp);

    place_kings(&mut map, players, rng)?;

    let mut pool: Vec<usize> = (0..map.area())
        .filter(|&idx| map.blocks()[idx].tile_type == TileType::Plain)
        .collect();
    let mut obstacles = 0;

    map.mountain_count = place_obstacles(
        &mut map,
        TileType::Mountain,
        targets.mountains,
        &mut obstacles,
        &mut pool,
        rng,
    );
    map.city_count = place_obstacles(
        &mut map,
        TileType::City,
        targets.cities,
        &mut obstacles,
        &mut pool,
        rng,
    );
    map.swamp_count = place_swamps(&mut map, targets.swamps, &mut pool, rng);

    debug!(
        width = params.width,
        height = params.height,
        mountains = map.mountain_count,
        mountains_requested = targets.mountains,
        cities = map.city_count,
        cities_requested = targets.cities,
        swamps = map.swamp_count,
        "generated map"
    );

    Ok(map)
}

/// Place a king for every contender that does not have one yet.
///
/// # Errors
///
/// Returns [`GenerationError::KingPlacement`] when a player exhausts their
/// sampling attempts.
pub fn place_kings<R: Rng + ?Sized>(
    map: &mut GameMap,
    players: &mut [Player],
    rng: &mut R,
) -> Result<(), GenerationError> {
    let mut kings: Vec<Point> = players.iter().filter_map(|p| p.king).collect();

    for i in 0..players.len() {
        if players[i].is_spectator() || players[i].king.is_some() {
            continue;
        }

        let point = sample_king_site(map, &kings, rng).ok_or_else(|| {
            GenerationError::KingPlacement {
                username: players[i].username.clone(),
                attempts: KING_PLACEMENT_ATTEMPTS,
            }
        })?;

        crown(map, players, i, point);
        kings.push(point);
    }

    Ok(())
}

/// Draw up to [`KING_PLACEMENT_ATTEMPTS`] random cells, returning the first
/// empty plain cell far enough from every existing king.
fn sample_king_site<R: Rng + ?Sized>(map: &GameMap, kings: &[Point], rng: &mut R) -> Option<Point> {
    for _ in 0..KING_PLACEMENT_ATTEMPTS {
        let point = map.point_of(rng.gen_range(0..map.area()));
        let Some(block) = map.get(point) else {
            continue;
        };
        if block.tile_type != TileType::Plain || block.owner.is_some() {
            continue;
        }
        if kings.iter().all(|k| k.manhattan(point) > KING_MIN_DISTANCE) {
            return Some(point);
        }
    }
    None
}

/// Turn the block at `point` into player `index`'s king.
fn crown(map: &mut GameMap, players: &mut [Player], index: usize, point: Point) {
    if let Some(block) = map.get_mut(point) {
        block.tile_type = TileType::King;
        block.unit = block.unit.max(1);
    }
    let id = players[index].id;
    map.set_owner(players, point, Some(id));
    players[index].king = Some(point);
}

/// Place up to `target` obstacles of one kind, keeping open terrain connected.
///
/// Stops early when [`OBSTACLE_ATTEMPTS`] consecutive candidates would
/// disconnect the map; returns how many were placed.
fn place_obstacles<R: Rng + ?Sized>(
    map: &mut GameMap,
    kind: TileType,
    target: u32,
    obstacles: &mut usize,
    pool: &mut Vec<usize>,
    rng: &mut R,
) -> u32 {
    let mut placed = 0;

    'outer: while placed < target {
        for _ in 0..OBSTACLE_ATTEMPTS {
            if pool.is_empty() {
                break 'outer;
            }
            let slot = rng.gen_range(0..pool.len());
            let idx = pool[slot];

            map.blocks_mut()[idx] = Block::new(kind);
            if is_connected(map, *obstacles + 1) {
                if kind == TileType::City {
                    map.blocks_mut()[idx].unit = rng.gen_range(CITY_UNIT_RANGE);
                }
                pool.swap_remove(slot);
                *obstacles += 1;
                placed += 1;
                continue 'outer;
            }
            map.blocks_mut()[idx] = Block::plain();
        }

        debug!(?kind, placed, target, "connectivity limit reached, accepting fewer obstacles");
        break;
    }

    placed
}

/// Place up to `target` swamps on random plain cells.
fn place_swamps<R: Rng + ?Sized>(
    map: &mut GameMap,
    target: u32,
    pool: &mut Vec<usize>,
    rng: &mut R,
) -> u32 {
    let mut placed = 0;
    while placed < target && !pool.is_empty() {
        let slot = rng.gen_range(0..pool.len());
        let idx = pool.swap_remove(slot);
        map.blocks_mut()[idx] = Block::new(TileType::Swamp);
        placed += 1;
    }
    placed
}

/// One cell of an authored map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTile {
    /// Terrain.
    pub tile_type: TileType,
    /// Starting units.
    #[serde(default)]
    pub unit: u32,
    /// King assignment order (lower first).
    #[serde(default)]
    pub priority: u8,
    /// Visible through fog.
    #[serde(default)]
    pub always_revealed: bool,
}

/// An externally authored map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMap {
    /// Display name.
    pub name: String,
    /// Width in tiles.
    pub width: u16,
    /// Height in tiles.
    pub height: u16,
    /// Tiles in row-major order.
    pub tiles: Vec<CustomTile>,
}

/// Build a map from an authored grid and hand out its kings.
///
/// Kings are assigned to contenders in ascending `priority`, ties broken
/// at random. Leftover kings become plain tiles; players left without a
/// king get one through random placement.
///
/// # Errors
///
/// Returns [`GenerationError::InvalidCustomMap`] if the grid is malformed,
/// or [`GenerationError::KingPlacement`] if fallback placement fails.
pub fn load_custom_map<R: Rng + ?Sized>(
    custom: &CustomMap,
    players: &mut [Player],
    rng: &mut R,
) -> Result<GameMap, GenerationError> {
    let mut map = GameMap::new(custom.width, custom.height)?;
    if custom.tiles.len() != map.area() {
        return Err(GenerationError::InvalidCustomMap(format!(
            "expected {} tiles, got {}",
            map.area(),
            custom.tiles.len()
        )));
    }
    map.name.clone_from(&custom.name);

    let mut king_sites = Vec::new();
    for (idx, tile) in custom.tiles.iter().enumerate() {
        if matches!(tile.tile_type, TileType::Fog | TileType::Obstacle) {
            return Err(GenerationError::InvalidCustomMap(format!(
                "tile {idx} uses view-only type {:?}",
                tile.tile_type
            )));
        }
        map.blocks_mut()[idx] = Block {
            tile_type: tile.tile_type,
            unit: tile.unit,
            owner: None,
            always_revealed: tile.always_revealed,
            priority: tile.priority,
        };
        match tile.tile_type {
            TileType::King => king_sites.push(idx),
            TileType::Mountain => map.mountain_count += 1,
            TileType::City => map.city_count += 1,
            TileType::Swamp => map.swamp_count += 1,
            _ => {}
        }
    }

    king_sites.shuffle(rng);
    king_sites.sort_by_key(|&idx| map.blocks()[idx].priority);

    let mut sites = king_sites.into_iter();
    for i in 0..players.len() {
        if players[i].is_spectator() || players[i].king.is_some() {
            continue;
        }
        let Some(idx) = sites.next() else {
            break;
        };
        let point = map.point_of(idx);
        crown(&mut map, players, i, point);
    }
    for idx in sites {
        let block = &mut map.blocks_mut()[idx];
        block.tile_type = TileType::Plain;
        block.unit = 0;
    }

    place_kings(&mut map, players, rng)?;
    Ok(map)
}

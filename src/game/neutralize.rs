//! Stripping a player of their territory.

use tracing::debug;

use crate::game::{GameMap, Player, PlayerId, TileType, player};

/// Eliminate `id` without handing their land to anyone.
///
/// The king tile is downgraded to a city, every owned tile keeps its
/// terrain and units but loses its owner, and the player is marked dead.
/// Calling this on an already neutral player changes nothing.
///
/// Returns whether any state changed.
pub fn neutralize(map: &mut GameMap, players: &mut [Player], id: PlayerId) -> bool {
    let Some(target) = player::find_mut(players, id) else {
        debug!(player = %id, "neutralize: unknown player");
        return false;
    };

    let mut changed = !target.is_dead;
    target.is_dead = true;

    match target.king.take() {
        Some(king) => {
            if let Some(block) = map.get_mut(king).filter(|b| b.tile_type == TileType::King) {
                block.tile_type = TileType::City;
            }
            changed = true;
        }
        None => debug!(player = %id, "neutralize: player has no king"),
    }

    let land = std::mem::take(&mut target.land);
    changed |= !land.is_empty();
    for point in land {
        if let Some(block) = map.get_mut(point).filter(|b| b.is_owned_by(id)) {
            block.be_neutralized();
        }
    }

    changed
}

/// Hand every tile `from` owns to `to`, returning how many moved.
pub fn transfer_land(map: &mut GameMap, players: &mut [Player], from: PlayerId, to: PlayerId) -> usize {
    let Some(loser) = player::find_mut(players, from) else {
        return 0;
    };
    let land = std::mem::take(&mut loser.land);
    let moved = land.len();

    for &point in &land {
        if let Some(block) = map.get_mut(point) {
            block.owner = Some(to);
        }
    }
    if let Some(winner) = player::find_mut(players, to) {
        winner.land.extend(land);
    }

    moved
}

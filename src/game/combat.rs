//! Attack resolution.
//!
//! An accepted order always leaves one unit on the origin. Against a tile
//! the attacker already owns the units reinforce it; otherwise they fight
//! the garrison by plain subtraction and take the tile only with a strict
//! majority. Losing a king tile this way is not resolved here: the
//! room's capture scan notices it on the next tick.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::AttackRejection;
use crate::game::{GameMap, Player, PlayerId, Point, player};

/// A move order from one tile to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    /// Origin tile, must be owned by the attacker.
    pub from: Point,
    /// Destination tile.
    pub to: Point,
    /// Send half of the movable units (rounded up) instead of all of them.
    #[serde(default)]
    pub half: bool,
}

/// What an accepted order did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Units joined a tile the attacker already owned.
    Reinforced {
        /// Units moved.
        moved: u32,
    },
    /// The garrison held.
    Repelled {
        /// Units moved.
        moved: u32,
    },
    /// The attacker took the tile.
    Captured {
        /// Units moved.
        moved: u32,
        /// Owner before the capture.
        previous_owner: Option<PlayerId>,
    },
}

/// Number of units an order from a tile holding `unit` units sends.
#[must_use]
pub const fn units_to_move(unit: u32, half: bool) -> u32 {
    let movable = unit.saturating_sub(1);
    if half { movable.div_ceil(2) } else { movable }
}

/// Validate and apply one order for `attacker`.
///
/// On success the attacker's `operated_turn` is set to the current turn,
/// whatever the combat result.
///
/// # Errors
///
/// Returns an [`AttackRejection`] and leaves all state untouched if the
/// attacker already acted this turn, either point is out of bounds, the
/// origin is not theirs, or the destination is a mountain.
pub fn attack(
    map: &mut GameMap,
    players: &mut [Player],
    attacker: PlayerId,
    order: AttackOrder,
) -> Result<AttackOutcome, AttackRejection> {
    let outcome =
        validate(map, players, attacker, order).map(|()| resolve(map, players, attacker, order));

    match &outcome {
        Ok(result) => trace!(player = %attacker, turn = map.turn, ?order, ?result, "attack applied"),
        Err(reason) => trace!(player = %attacker, turn = map.turn, ?order, %reason, "attack rejected"),
    }
    outcome
}

fn validate(
    map: &GameMap,
    players: &[Player],
    attacker: PlayerId,
    order: AttackOrder,
) -> Result<(), AttackRejection> {
    let player = player::find(players, attacker).ok_or(AttackRejection::UnknownPlayer)?;
    if player.operated_turn >= map.turn {
        return Err(AttackRejection::RateLimited {
            turn: player.operated_turn,
        });
    }

    let origin = map
        .get(order.from)
        .ok_or(AttackRejection::OutOfBounds(order.from))?;
    let destination = map
        .get(order.to)
        .ok_or(AttackRejection::OutOfBounds(order.to))?;

    if !origin.is_owned_by(attacker) {
        return Err(AttackRejection::NotOwner(order.from));
    }
    if !destination.tile_type.is_passable() {
        return Err(AttackRejection::Mountain(order.to));
    }
    Ok(())
}

fn resolve(
    map: &mut GameMap,
    players: &mut [Player],
    attacker: PlayerId,
    order: AttackOrder,
) -> AttackOutcome {
    let turn = map.turn;
    if let Some(p) = player::find_mut(players, attacker) {
        p.operated_turn = turn;
    }

    let moved = map
        .get_mut(order.from)
        .map_or(0, |origin| {
            let moved = units_to_move(origin.unit, order.half);
            origin.unit -= moved;
            moved
        });

    let Some(destination) = map.get_mut(order.to) else {
        return AttackOutcome::Repelled { moved };
    };

    if destination.is_owned_by(attacker) {
        destination.unit = destination.unit.saturating_add(moved);
        return AttackOutcome::Reinforced { moved };
    }

    if destination.unit >= moved {
        destination.unit -= moved;
        return AttackOutcome::Repelled { moved };
    }

    destination.unit = moved - destination.unit;
    let previous_owner = map.set_owner(players, order.to, Some(attacker));
    AttackOutcome::Captured {
        moved,
        previous_owner,
    }
}

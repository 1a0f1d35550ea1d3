//! Game invariants - sanity checks that detect bugs.
//!
//! These should never trigger in a correctly implemented game. The room
//! runs them after every tick in debug builds, once the capture scan has
//! settled king ownership.

use std::fmt;

use crate::game::{GameMap, Player, TileType, player};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(map: &GameMap, players: &[Player]) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut report = |message: String| violations.push(InvariantViolation { message });

    // Grid side of the owner/land bijection
    for (point, block) in map.iter() {
        if matches!(block.tile_type, TileType::Fog | TileType::Obstacle) {
            report(format!("view-only tile {:?} on the grid at {point}", block.tile_type));
        }
        let Some(owner) = block.owner else {
            continue;
        };
        if block.tile_type == TileType::Mountain {
            report(format!("mountain at {point} is owned by {owner}"));
        }
        match player::find(players, owner) {
            Some(p) if p.land.contains(&point) => {}
            Some(p) => report(format!("{point} owned by {} but missing from their land", p.username)),
            None => report(format!("{point} owned by unknown player {owner}")),
        }
    }

    // Player side
    for p in players {
        for &point in &p.land {
            match map.get(point) {
                Some(block) if block.is_owned_by(p.id) => {}
                Some(block) => report(format!(
                    "{} lists {point} as land but its owner is {:?}",
                    p.username, block.owner
                )),
                None => report(format!("{} lists out-of-bounds {point} as land", p.username)),
            }
        }

        if p.is_dead && !p.land.is_empty() {
            report(format!("dead player {} still owns {} tiles", p.username, p.land.len()));
        }

        if let Some(king) = p.king {
            match map.get(king) {
                Some(block) if block.tile_type == TileType::King && block.is_owned_by(p.id) => {}
                _ => report(format!("{} has lost their king at {king} but is alive", p.username)),
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(map: &GameMap, players: &[Player]) {
    let violations = check_invariants(map, players);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_map: &GameMap, _players: &[Player]) {}

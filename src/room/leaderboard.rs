//! Per-turn standings.

use serde::{Deserialize, Serialize};

use crate::game::{GameMap, Player, get_total};

/// One row of the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player color index.
    pub color: u8,
    /// Player team.
    pub team: u8,
    /// Units across all owned tiles.
    pub army: u64,
    /// Owned tiles.
    pub land: usize,
}

/// Standings of every living, non-spectating player, strongest first.
///
/// Sorted by army, then land, both descending; ties keep roster order.
#[must_use]
pub fn compute_leaderboard(map: &GameMap, players: &[Player]) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardEntry> = players
        .iter()
        .filter(|p| p.is_contender())
        .map(|p| {
            let totals = get_total(map, p);
            LeaderboardEntry {
                color: p.color,
                team: p.team,
                army: totals.army,
                land: totals.land,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.army.cmp(&a.army).then(b.land.cmp(&a.land)));
    rows
}

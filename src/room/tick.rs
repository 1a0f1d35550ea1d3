//! The per-turn scheduler body.
//!
//! One call to [`Room::tick`] runs, in order: the king capture scan, the
//! AFK check, the leaderboard, one fogged update per connected player, the
//! replay append, the turn advance with unit growth, and finally the
//! end-of-game check. The order is observable by clients and by replays.

use std::collections::BTreeSet;

use tracing::{error, info};

use crate::error::TickError;
use crate::game::invariants::check_invariants;
use crate::game::{
    GameMap, Player, TileType, TileView, full_view, neutralize, player, transfer_land, update_unit,
    view_for_player,
};
use crate::protocol::{Emitter, ServerEvent};
use crate::room::{LeaderboardEntry, Room, RoomConfig, RoomId, compute_leaderboard};

/// Players who have not had an order accepted by this turn are
/// neutralized.
pub const AFK_TURN_LIMIT: u32 = 160;

/// What happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game continues; keep ticking.
    Continue,
    /// The game finished this tick and the room is back in the lobby.
    Ended {
        /// Stored replay, if saving succeeded.
        replay_id: Option<String>,
    },
}

impl Room {
    /// Advance the running game by one turn.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::NoGame`] outside a game. In debug builds a
    /// broken ownership invariant is reported as [`TickError::Invariant`]
    /// unless the game ended this tick.
    pub fn tick(&mut self, out: &mut dyn Emitter) -> Result<TickOutcome, TickError> {
        let Some(map) = self.map.as_mut() else {
            return Err(TickError::NoGame);
        };

        capture_scan(&self.id, map, &mut self.players, out);
        afk_check(&self.id, map, &mut self.players, out);

        let leaderboard = compute_leaderboard(map, &self.players);
        let unfogged = full_view(map, &self.players);
        send_updates(map, &mut self.players, &self.config, &unfogged, &leaderboard, out);

        if let Some(record) = self.record.as_mut() {
            let diff = self.replay_diff.patch(unfogged);
            record.push_turn(map.turn, diff, leaderboard);
        }

        map.turn += 1;
        update_unit(map, &mut self.players);

        let violation = if cfg!(debug_assertions) {
            check_invariants(map, &self.players).into_iter().next()
        } else {
            None
        };

        let teams: BTreeSet<u8> = self
            .players
            .iter()
            .filter(|p| p.is_contender())
            .map(|p| p.team)
            .collect();
        if teams.len() <= 1 {
            let replay_id = self.end_game(teams.first().copied(), out);
            return Ok(TickOutcome::Ended { replay_id });
        }

        match violation {
            Some(violation) => {
                error!(room = %self.id, %violation, "tick left the game inconsistent");
                Err(TickError::Invariant(violation.message))
            }
            None => Ok(TickOutcome::Continue),
        }
    }
}

/// Eliminate every player whose king tile has changed hands.
///
/// The capturer takes the victim's remaining land and the king tile
/// becomes a city. A king tile with no owner at all only neutralizes.
fn capture_scan(room: &RoomId, map: &mut GameMap, players: &mut [Player], out: &mut dyn Emitter) {
    for idx in 0..players.len() {
        let victim = &players[idx];
        if !victim.is_contender() || victim.disconnected {
            continue;
        }
        let Some(king) = victim.king else {
            continue;
        };
        let victim_id = victim.id;

        match map.get(king).and_then(|b| b.owner) {
            Some(owner) if owner == victim_id => {}
            Some(capturer_id) => {
                let moved = transfer_land(map, players, victim_id, capturer_id);
                if let Some(block) = map.get_mut(king) {
                    block.tile_type = TileType::City;
                }
                let victim = &mut players[idx];
                victim.is_dead = true;
                victim.king = None;

                let victim = victim.summary();
                let Some(capturer) = player::find(players, capturer_id).map(Player::summary) else {
                    continue;
                };
                info!(
                    room = %room,
                    turn = map.turn,
                    capturer = %capturer.username,
                    victim = %victim.username,
                    land = moved,
                    "king captured"
                );
                out.to_room(
                    room,
                    ServerEvent::Captured {
                        capturer: capturer.clone(),
                        victim,
                    },
                );
                out.to_connection(players[idx].connection, ServerEvent::GameOver { capturer });
            }
            None => {
                info!(room = %room, turn = map.turn, player = %victim_id, "king tile lost to neutral");
                neutralize(map, players, victim_id);
            }
        }
    }
}

/// Neutralize contenders that never had an order accepted once the turn
/// limit is reached.
fn afk_check(room: &RoomId, map: &mut GameMap, players: &mut [Player], out: &mut dyn Emitter) {
    if map.turn < AFK_TURN_LIMIT {
        return;
    }
    for idx in 0..players.len() {
        let candidate = &players[idx];
        if !candidate.is_contender() || candidate.operated_turn != 0 {
            continue;
        }
        let id = candidate.id;
        neutralize(map, players, id);
        info!(room = %room, turn = map.turn, player = %id, "idle player neutralized");
        out.to_room(
            room,
            ServerEvent::Surrendered {
                player: players[idx].summary(),
            },
        );
    }
}

/// Whether `viewer` gets the unfogged grid.
fn sees_everything(viewer: &Player, config: &RoomConfig) -> bool {
    !config.fog_of_war || viewer.is_spectator() || (viewer.is_dead && config.death_spectator)
}

/// Send each connected player a patch against what they last saw.
fn send_updates(
    map: &GameMap,
    players: &mut [Player],
    config: &RoomConfig,
    unfogged: &[TileView],
    leaderboard: &[LeaderboardEntry],
    out: &mut dyn Emitter,
) {
    for idx in 0..players.len() {
        let viewer = &players[idx];
        if viewer.disconnected {
            continue;
        }
        let view = if sees_everything(viewer, config) {
            unfogged.to_vec()
        } else {
            view_for_player(map, players, viewer)
        };
        let connection = viewer.connection;
        let diff = players[idx].last_sent_view.patch(view);
        out.to_connection(
            connection,
            ServerEvent::GameUpdate {
                diff,
                turn: map.turn,
                leaderboard: leaderboard.to_vec(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffEntry, apply_diff};
    use crate::game::{ConnectionId, SPECTATOR_TEAM};
    use crate::protocol::Envelope;
    use crate::room::tests::{events_for, room, started_room};

    /// Two players on a bare 10x10 map.
    fn duel() -> (Room, Vec<Envelope>) {
        for seed in 0..50 {
            let mut room = room().with_seed(seed);
            room.config.mountain = 0.0;
            room.config.city = 0.0;
            room.config.swamp = 0.0;
            let mut out = Vec::new();
            room.join(ConnectionId(1), "a", &mut out).unwrap();
            room.join(ConnectionId(2), "b", &mut out).unwrap();
            if room.start_game(&mut out).is_ok() {
                return (room, out);
            }
        }
        panic!("no seed started a game");
    }

    fn updates(out: &[Envelope], connection: ConnectionId) -> Vec<(Vec<DiffEntry>, u32)> {
        events_for(out, connection)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::GameUpdate { diff, turn, .. } => Some((diff.clone(), *turn)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tick_without_game() {
        let mut room = room();
        assert!(matches!(room.tick(&mut Vec::new()), Err(TickError::NoGame)));
    }

    #[test]
    fn test_duel_opening_attack() {
        let (mut room, mut out) = duel();
        let map = room.map().unwrap();
        assert_eq!((map.width(), map.height()), (10, 10));
        let kings: Vec<_> = map.blocks().iter().filter(|b| b.tile_type == TileType::King).collect();
        assert_eq!(kings.len(), 2);
        assert!(kings.iter().all(|b| b.unit == 1));

        // A king holding one unit has nothing to move until it grows.
        for _ in 0..2 {
            assert_eq!(room.tick(&mut out).unwrap(), TickOutcome::Continue);
        }
        let map = room.map().unwrap();
        assert_eq!(map.turn, 2);
        let king = room.players()[0].king.unwrap();
        assert_eq!(map.get(king).unwrap().unit, 2);

        let target = king
            .orthogonal()
            .into_iter()
            .find(|p| map.get(*p).is_some_and(|b| b.owner.is_none()))
            .unwrap();
        room.handle_attack(ConnectionId(1), king, target, false, &mut out);

        let map = room.map().unwrap();
        let a = room.players()[0].id;
        assert_eq!(map.get(target).unwrap().owner, Some(a));
        assert_eq!(map.get(target).unwrap().unit, 1);
        assert_eq!(map.get(king).unwrap().unit, 1);

        out.clear();
        assert_eq!(room.tick(&mut out).unwrap(), TickOutcome::Continue);
        let sent = updates(&out, ConnectionId(1));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, 2);
        // The new tile and its halo changed; the rest is runs.
        assert!(sent[0].0.iter().any(|e| matches!(e, DiffEntry::Same(_))));
    }

    #[test]
    fn test_updates_rebuild_fogged_view() {
        let (mut room, mut out) = duel();
        out.clear();
        let mut grid: Option<Vec<TileView>> = None;
        for _ in 0..4 {
            room.tick(&mut out).unwrap();
        }
        for (diff, _) in updates(&out, ConnectionId(2)) {
            grid = Some(apply_diff(grid.as_deref(), &diff).unwrap());
        }

        let map = room.map().unwrap();
        let viewer = &room.players()[1];
        // Growth ran after the last update was sent.
        let mut expected = view_for_player(map, room.players(), viewer);
        let king = map.index_of(viewer.king.unwrap()).unwrap();
        let grid = grid.unwrap();
        expected[king].unit = grid[king].unit;
        assert_eq!(grid, expected);
    }

    #[test]
    fn test_replay_records_every_turn() {
        let (mut room, mut out) = duel();
        for _ in 0..3 {
            room.tick(&mut out).unwrap();
        }
        let record = room.record().unwrap();
        let turns: Vec<u32> = record.turns.iter().map(|t| t.turn).collect();
        assert_eq!(turns, vec![0, 1, 2]);
        assert!(record.turns[0].diff.iter().all(|e| matches!(e, DiffEntry::Changed(_))));
        assert_eq!(record.turns[0].leaderboard.len(), 2);
    }

    #[test]
    fn test_capture_transfers_land() {
        let (mut room, mut out) = started_room(3);
        let (a, b) = (room.players()[0].id, room.players()[1].id);
        let king_b = room.players()[1].king.unwrap();
        let (spare, _) = room
            .map()
            .unwrap()
            .iter()
            .find(|(_, blk)| blk.tile_type == TileType::Plain && blk.owner.is_none())
            .unwrap();
        {
            let map = room.map.as_mut().unwrap();
            map.set_owner(&mut room.players, spare, Some(b));
            map.set_owner(&mut room.players, king_b, Some(a));
        }
        out.clear();

        assert_eq!(room.tick(&mut out).unwrap(), TickOutcome::Continue);

        let map = room.map().unwrap();
        assert_eq!(map.get(king_b).unwrap().tile_type, TileType::City);
        assert_eq!(map.get(king_b).unwrap().owner, Some(a));
        assert_eq!(map.get(spare).unwrap().owner, Some(a));
        let victim = &room.players()[1];
        assert!(victim.is_dead);
        assert!(victim.land.is_empty());
        assert_eq!(victim.king, None);

        assert!(events_for(&out, ConnectionId(2))
            .iter()
            .any(|e| matches!(e, ServerEvent::GameOver { capturer } if capturer.id == a)));
        assert!(!events_for(&out, ConnectionId(1))
            .iter()
            .any(|e| matches!(e, ServerEvent::GameOver { .. })));
        assert!(out.iter().any(|e| matches!(
            &e.event,
            ServerEvent::Captured { capturer, victim } if capturer.id == a && victim.id == b
        )));
    }

    #[test]
    fn test_last_capture_ends_game() {
        let (mut room, mut out) = duel();
        let a = room.players()[0].id;
        let king_b = room.players()[1].king.unwrap();
        {
            let map = room.map.as_mut().unwrap();
            map.set_owner(&mut room.players, king_b, Some(a));
        }
        out.clear();

        let outcome = room.tick(&mut out).unwrap();
        let TickOutcome::Ended { replay_id } = outcome else {
            panic!("game should have ended");
        };
        assert!(replay_id.is_some());
        assert!(!room.game_started());
        assert!(out.iter().any(|e| matches!(
            &e.event,
            ServerEvent::GameEnded { winners, .. } if winners.len() == 1 && winners[0].id == a
        )));
    }

    #[test]
    fn test_idle_player_is_neutralized() {
        let (mut room, mut out) = duel();
        for _ in 0..2 {
            room.tick(&mut out).unwrap();
        }
        let king = room.players()[0].king.unwrap();
        let target = king
            .orthogonal()
            .into_iter()
            .find(|p| room.map().unwrap().get(*p).is_some_and(|b| b.owner.is_none()))
            .unwrap();
        room.handle_attack(ConnectionId(1), king, target, false, &mut out);
        assert_eq!(room.players()[0].operated_turn, 2);

        let (last_turn, replay_id) = loop {
            let turn = room.map().unwrap().turn;
            out.clear();
            match room.tick(&mut out).unwrap() {
                TickOutcome::Continue => assert!(turn < AFK_TURN_LIMIT),
                TickOutcome::Ended { replay_id } => break (turn, replay_id),
            }
        };

        assert_eq!(last_turn, AFK_TURN_LIMIT);
        assert!(replay_id.is_some());
        let a = room.players().iter().find(|p| p.username == "a").unwrap().id;
        assert!(out.iter().any(|e| matches!(
            &e.event,
            ServerEvent::Surrendered { player } if player.username == "b"
        )));
        assert!(out.iter().any(|e| matches!(
            &e.event,
            ServerEvent::GameEnded { winners, .. } if winners.len() == 1 && winners[0].id == a
        )));
    }

    #[test]
    fn test_disconnected_players_get_no_updates() {
        let (mut room, mut out) = started_room(3);
        room.leave(ConnectionId(3), &mut out).unwrap();
        out.clear();

        assert_eq!(room.tick(&mut out).unwrap(), TickOutcome::Continue);
        assert!(updates(&out, ConnectionId(3)).is_empty());
        assert_eq!(updates(&out, ConnectionId(1)).len(), 1);
    }

    #[test]
    fn test_reconnect_gets_full_frame() {
        let (mut room, mut out) = started_room(3);
        let id = room.players()[2].id;
        room.tick(&mut out).unwrap();
        room.leave(ConnectionId(3), &mut out).unwrap();
        room.tick(&mut out).unwrap();

        room.reconnect(ConnectionId(30), id, "p3", &mut out).unwrap();
        out.clear();
        room.tick(&mut out).unwrap();

        let sent = updates(&out, ConnectionId(30));
        assert_eq!(sent.len(), 1);
        let area = room.map().unwrap().area();
        assert_eq!(sent[0].0.len(), area);
        assert!(sent[0].0.iter().all(|e| matches!(e, DiffEntry::Changed(_))));

        // Dead with death_spectator: the frame is the whole board.
        let grid = apply_diff(None, &sent[0].0).unwrap();
        assert!(grid.iter().all(|v| v.tile_type != TileType::Fog));
    }

    #[test]
    fn test_spectator_sees_whole_board() {
        let mut room = room();
        room.config.map_width = 1.0;
        room.config.map_height = 1.0;
        let mut out = Vec::new();
        for c in 1..=3 {
            room.join(ConnectionId(c), &format!("p{c}"), &mut out).unwrap();
        }
        room.change_team(ConnectionId(3), SPECTATOR_TEAM, &mut out).unwrap();
        let mut started = false;
        for seed in 0..20 {
            room.rng = rand::SeedableRng::seed_from_u64(seed);
            if room.start_game(&mut out).is_ok() {
                started = true;
                break;
            }
        }
        assert!(started);
        out.clear();

        room.tick(&mut out).unwrap();
        let sent = updates(&out, ConnectionId(3));
        let grid = apply_diff(None, &sent[0].0).unwrap();
        assert!(grid.iter().all(|v| !matches!(v.tile_type, TileType::Fog | TileType::Obstacle)));
        let fogged = apply_diff(None, &updates(&out, ConnectionId(1))[0].0).unwrap();
        assert!(fogged.iter().any(|v| v.tile_type == TileType::Fog));
    }
}

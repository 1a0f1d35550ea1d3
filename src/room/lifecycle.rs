//! Starting and ending games.

use tracing::{error, info, warn};

use crate::diff::MapDiff;
use crate::error::RoomError;
use crate::game::{GenerationParams, Player, PlayerSummary, generate_map, load_custom_map};
use crate::protocol::{Emitter, InitInfo, ServerEvent};
use crate::replay::GameRecord;
use crate::room::Room;

impl Room {
    /// Generate a map and switch the room to in-progress.
    ///
    /// On failure every player is reset, the room stays in the lobby, and
    /// the error is broadcast to the room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyStarted`] if a game is running, or
    /// [`RoomError::Generation`] if the map could not be built.
    pub fn start_game(&mut self, out: &mut dyn Emitter) -> Result<(), RoomError> {
        if self.game_started {
            return Err(RoomError::AlreadyStarted);
        }

        for player in &mut self.players {
            player.reset();
        }
        self.force_start_num = 0;

        let contenders = self.players.iter().filter(|p| !p.is_spectator()).count();
        let (width, height) = self.config.map_dimensions(contenders);
        let generated = match &self.custom_map {
            Some(custom) => load_custom_map(custom, &mut self.players, &mut self.rng),
            None => {
                let params = GenerationParams {
                    width,
                    height,
                    mountain: self.config.mountain,
                    city: self.config.city,
                    swamp: self.config.swamp,
                };
                generate_map(&params, &mut self.players, &mut self.rng)
            }
        };

        let mut map = match generated {
            Ok(map) => map,
            Err(err) => {
                warn!(room = %self.id, %err, "map generation failed, staying in lobby");
                for player in &mut self.players {
                    player.reset();
                }
                out.to_room(
                    &self.id,
                    ServerEvent::Error {
                        message: format!("game start failed: {err}"),
                    },
                );
                self.broadcast_room(out);
                return Err(err.into());
            }
        };

        if self.config.warring_states {
            for king in self.players.iter().filter_map(|p| p.king) {
                if let Some(block) = map.get_mut(king) {
                    block.always_revealed = true;
                }
            }
        }

        let roster: Vec<PlayerSummary> = self.players.iter().map(Player::summary).collect();
        self.record = Some(GameRecord::new(
            self.room_name.clone(),
            map.name.clone(),
            map.width(),
            map.height(),
            self.config,
            roster.clone(),
        ));
        self.replay_diff = MapDiff::new();
        self.game_started = true;

        info!(
            room = %self.id,
            players = contenders,
            width = map.width(),
            height = map.height(),
            mountains = map.mountain_count,
            cities = map.city_count,
            swamps = map.swamp_count,
            "game started"
        );

        for player in &self.players {
            out.to_connection(
                player.connection,
                ServerEvent::GameStarted(InitInfo {
                    king: player.king,
                    map_width: map.width(),
                    map_height: map.height(),
                    players: roster.clone(),
                }),
            );
        }
        self.map = Some(map);
        self.broadcast_room(out);
        Ok(())
    }

    /// Finish the running game with `winning_team` as the last team
    /// standing, returning the stored replay's id.
    ///
    /// Players who disconnected during the game are dropped; everyone else
    /// is reset for the next game.
    pub(crate) fn end_game(&mut self, winning_team: Option<u8>, out: &mut dyn Emitter) -> Option<String> {
        let winners: Vec<PlayerSummary> = self
            .players
            .iter()
            .filter(|p| p.is_contender() && Some(p.team) == winning_team)
            .map(Player::summary)
            .collect();
        let turn = self.map.as_ref().map_or(0, |m| m.turn);

        let replay_id = self.record.take().and_then(|mut record| {
            record.winners.clone_from(&winners);
            match self.replays.save(&record) {
                Ok(id) => Some(id),
                Err(err) => {
                    error!(room = %self.id, %err, "failed to save replay");
                    None
                }
            }
        });

        info!(
            room = %self.id,
            turn,
            winners = ?winners.iter().map(|w| w.username.as_str()).collect::<Vec<_>>(),
            replay = ?replay_id,
            "game ended"
        );
        out.to_room(
            &self.id,
            ServerEvent::GameEnded {
                winners,
                replay_id: replay_id.clone(),
            },
        );

        self.game_started = false;
        self.map = None;
        self.force_start_num = 0;
        self.players.retain(|p| !p.disconnected);
        for player in &mut self.players {
            player.reset();
        }
        self.recolor();
        self.reassign_host();
        self.broadcast_room(out);

        replay_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ConnectionId, TileType};
    use crate::room::tests::{events_for, room, started_room};

    #[test]
    fn test_start_game_sends_init_info() {
        let (room, out) = started_room(2);
        assert!(room.game_started());
        let map = room.map().unwrap();
        assert_eq!((map.width(), map.height()), (20, 20));
        assert!(room.record().is_some());

        for player in room.players() {
            let king = player.king.unwrap();
            let init = events_for(&out, player.connection)
                .into_iter()
                .find_map(|e| match e {
                    ServerEvent::GameStarted(init) => Some(init.clone()),
                    _ => None,
                })
                .unwrap();
            assert_eq!(init.king, Some(king));
            assert_eq!(init.players.len(), 2);
        }
    }

    #[test]
    fn test_cannot_start_twice() {
        let (mut room, mut out) = started_room(2);
        assert!(matches!(room.start_game(&mut out), Err(RoomError::AlreadyStarted)));
    }

    #[test]
    fn test_generation_failure_stays_in_lobby() {
        let mut room = room();
        // 10x10 with 16 players cannot seat every king.
        room.config.max_players = 16;
        room.config.map_width = 0.2;
        room.config.map_height = 0.2;
        let mut out = Vec::new();
        for c in 1..=16 {
            room.join(ConnectionId(c), &format!("p{c}"), &mut out).unwrap();
        }
        out.clear();

        assert!(matches!(room.start_game(&mut out), Err(RoomError::Generation(_))));
        assert!(!room.game_started());
        assert!(room.map().is_none());
        assert!(room.players().iter().all(|p| p.king.is_none() && p.land.is_empty()));
        assert!(out.iter().any(|e| matches!(&e.event, ServerEvent::Error { .. })));
    }

    #[test]
    fn test_warring_states_reveals_kings() {
        for seed in 0..20 {
            let mut room = room().with_seed(seed);
            room.config.warring_states = true;
            room.config.map_width = 1.0;
            room.config.map_height = 1.0;
            let mut out = Vec::new();
            room.join(ConnectionId(1), "a", &mut out).unwrap();
            room.join(ConnectionId(2), "b", &mut out).unwrap();
            if room.start_game(&mut out).is_ok() {
                let map = room.map().unwrap();
                assert!(
                    map.blocks()
                        .iter()
                        .filter(|b| b.tile_type == TileType::King)
                        .all(|b| b.always_revealed)
                );
                return;
            }
        }
        panic!("no seed started a game");
    }

    #[test]
    fn test_custom_map_is_used() {
        use crate::game::{CustomMap, CustomTile, Point};

        let plain = CustomTile {
            tile_type: TileType::Plain,
            unit: 0,
            priority: 0,
            always_revealed: false,
        };
        let mut tiles = vec![plain; 15 * 3];
        tiles[0] = CustomTile {
            tile_type: TileType::King,
            unit: 3,
            ..plain
        };
        tiles[44] = CustomTile {
            tile_type: TileType::King,
            unit: 3,
            priority: 1,
            ..plain
        };

        let mut room = room();
        room.set_custom_map(Some(CustomMap {
            name: "corridor".into(),
            width: 15,
            height: 3,
            tiles,
        }));
        let mut out = Vec::new();
        room.join(ConnectionId(1), "a", &mut out).unwrap();
        room.join(ConnectionId(2), "b", &mut out).unwrap();
        room.start_game(&mut out).unwrap();

        let map = room.map().unwrap();
        assert_eq!(map.name, "corridor");
        assert_eq!((map.width(), map.height()), (15, 3));
        assert_eq!(room.players()[0].king, Some(Point::new(0, 0)));
        assert_eq!(room.players()[1].king, Some(Point::new(14, 2)));
        assert_eq!(room.record().unwrap().map_name, "corridor");
    }

    #[test]
    fn test_end_game_resets_and_drops_disconnected() {
        let (mut room, mut out) = started_room(3);
        room.leave(ConnectionId(3), &mut out).unwrap();
        out.clear();

        let team = room.players()[0].team;
        let replay_id = room.end_game(Some(team), &mut out);

        assert!(replay_id.is_some());
        assert!(!room.game_started());
        assert_eq!(room.players().len(), 2);
        assert!(room.players().iter().all(|p| !p.is_dead && p.king.is_none()));
        match &out[0].event {
            ServerEvent::GameEnded { winners, replay_id: id } => {
                assert_eq!(winners.len(), 1);
                assert_eq!(winners[0].username, "p1");
                assert_eq!(id, &replay_id);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

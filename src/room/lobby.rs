//! Roster management: joining, leaving, votes, teams, host, and chat.

use tracing::{debug, info};

use crate::error::{JoinRejection, RoomError, SettingsError};
use crate::game::{
    AttackOrder, ConnectionId, MAX_TEAM_NUM, Player, PlayerId, Point, SPECTATOR_TEAM, attack,
    neutralize,
};
use crate::protocol::{Emitter, InitInfo, ServerEvent};
use crate::replay::ChatRecord;
use crate::room::config::validate_room_name;
use crate::room::{Room, Setting};

/// Ready votes needed to start, indexed by non-spectator count.
pub const FORCE_START_OK: [usize; 17] = [0, 1, 2, 2, 3, 3, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9];

/// Fewest non-spectators a game can start with.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Longest chat message, in characters.
pub const MAX_MESSAGE_LEN: usize = 256;

/// Votes required to start with `active` non-spectators.
#[must_use]
pub fn required_votes(active: usize) -> usize {
    FORCE_START_OK
        .get(active)
        .copied()
        .unwrap_or(FORCE_START_OK[FORCE_START_OK.len() - 1])
}

impl Room {
    /// Add a new player bound to `connection`.
    ///
    /// The first player becomes host. New players take the next color and
    /// the lowest team nobody uses yet.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Join`] if the room is full, a game is running,
    /// the connection already joined, or the name is blank.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        username: &str,
        out: &mut dyn Emitter,
    ) -> Result<PlayerId, RoomError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(JoinRejection::EmptyUsername.into());
        }
        if self.players.iter().any(|p| p.connection == connection && !p.disconnected) {
            return Err(JoinRejection::AlreadyJoined.into());
        }
        if self.game_started {
            return Err(JoinRejection::GameStarted.into());
        }
        if self.players.len() >= self.config.max_players {
            return Err(JoinRejection::RoomFull.into());
        }

        let team = (1..=MAX_TEAM_NUM)
            .find(|t| !self.players.iter().any(|p| p.team == *t))
            .unwrap_or(SPECTATOR_TEAM);
        let color = u8::try_from(self.players.len()).unwrap_or(u8::MAX);
        let mut player = Player::new(PlayerId::new(), connection, username.to_string(), color, team);
        player.is_room_host = self.players.is_empty();
        let id = player.id;
        self.players.push(player);

        info!(room = %self.id, player = %id, %username, %connection, "player joined");
        out.to_connection(connection, ServerEvent::SetPlayer { player_id: id });
        self.broadcast_room(out);
        Ok(id)
    }

    /// Rebind `connection` to an existing player during a game, or join
    /// as a new player otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`Room::join`] when the request falls back to a fresh join.
    pub fn reconnect(
        &mut self,
        connection: ConnectionId,
        player_id: PlayerId,
        username: &str,
        out: &mut dyn Emitter,
    ) -> Result<PlayerId, RoomError> {
        let existing = self.players.iter().position(|p| p.id == player_id);
        let (Some(idx), true) = (existing, self.game_started) else {
            return self.join(connection, username, out);
        };

        let player = &mut self.players[idx];
        player.connection = connection;
        player.disconnected = false;
        player.last_sent_view.reset();
        let king = player.king;

        info!(room = %self.id, player = %player_id, %connection, "player reconnected");
        out.to_connection(connection, ServerEvent::SetPlayer { player_id });
        if let Some(map) = &self.map {
            out.to_connection(
                connection,
                ServerEvent::GameStarted(InitInfo {
                    king,
                    map_width: map.width(),
                    map_height: map.height(),
                    players: self.players.iter().map(Player::summary).collect(),
                }),
            );
        }
        self.broadcast_room(out);
        Ok(player_id)
    }

    /// Handle a player leaving or their connection dropping.
    ///
    /// In the lobby the player is removed. During a game they are marked
    /// disconnected and neutralized, and dropped at the next game end.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotInRoom`] for unknown connections.
    pub fn leave(&mut self, connection: ConnectionId, out: &mut dyn Emitter) -> Result<(), RoomError> {
        let idx = self.player_index(connection)?;

        if self.game_started {
            let id = self.players[idx].id;
            self.players[idx].disconnected = true;
            if let Some(map) = self.map.as_mut() {
                neutralize(map, &mut self.players, id);
            }
            info!(room = %self.id, player = %id, "player disconnected mid-game");
            out.to_room(
                &self.id,
                ServerEvent::PlayerDisconnected {
                    player: self.players[idx].summary(),
                },
            );
        } else {
            let player = self.players.remove(idx);
            info!(room = %self.id, player = %player.id, "player left");
            self.recolor();
        }

        self.reassign_host();
        if !self.game_started {
            self.recount_votes(out);
        }
        self.broadcast_room(out);
        Ok(())
    }

    /// Flip the sender's ready vote and start the game once enough
    /// non-spectators are ready.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyStarted`] during a game, or
    /// [`RoomError::NotInRoom`] for unknown connections.
    pub fn toggle_force_start(
        &mut self,
        connection: ConnectionId,
        out: &mut dyn Emitter,
    ) -> Result<(), RoomError> {
        let idx = self.player_index(connection)?;
        if self.game_started {
            return Err(RoomError::AlreadyStarted);
        }
        if self.players[idx].is_spectator() {
            return Ok(());
        }

        let player = &mut self.players[idx];
        player.force_start = !player.force_start;
        self.recount_votes(out);
        self.broadcast_room(out);
        self.maybe_start(out);
        Ok(())
    }

    /// Move the sender to another team, or to spectating.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidTeam`] for teams outside
    /// `1..=MAX_TEAM_NUM + 1`, or [`RoomError::AlreadyStarted`] during a
    /// game.
    pub fn change_team(
        &mut self,
        connection: ConnectionId,
        team: u8,
        out: &mut dyn Emitter,
    ) -> Result<(), RoomError> {
        let idx = self.player_index(connection)?;
        if self.game_started {
            return Err(RoomError::AlreadyStarted);
        }
        if team == 0 || team > SPECTATOR_TEAM {
            return Err(SettingsError::InvalidTeam(team).into());
        }

        let player = &mut self.players[idx];
        player.team = team;
        if player.is_spectator() {
            player.force_start = false;
        }
        self.recount_votes(out);
        self.broadcast_room(out);
        self.maybe_start(out);
        Ok(())
    }

    /// Transfer host rights.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotHost`] if the sender is not host, or
    /// [`SettingsError::UnknownPlayer`] if the target is not here.
    pub fn change_host(
        &mut self,
        connection: ConnectionId,
        target: PlayerId,
        out: &mut dyn Emitter,
    ) -> Result<(), RoomError> {
        let idx = self.require_host(connection)?;
        let new_host = self
            .players
            .iter()
            .position(|p| p.id == target && !p.disconnected)
            .ok_or(SettingsError::UnknownPlayer)?;

        self.players[idx].is_room_host = false;
        self.players[new_host].is_room_host = true;
        info!(room = %self.id, host = %target, "host changed");
        self.broadcast_room(out);
        Ok(())
    }

    /// Apply one settings change from the host.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the sender is not host, a game is
    /// running, or the value is out of range.
    pub fn change_setting(
        &mut self,
        connection: ConnectionId,
        setting: Setting,
        out: &mut dyn Emitter,
    ) -> Result<(), RoomError> {
        self.require_host(connection)?;
        if self.game_started {
            return Err(SettingsError::GameInProgress.into());
        }

        match &setting {
            Setting::RoomName(name) => self.room_name = validate_room_name(name)?,
            other => self.config.apply(other, self.players.len())?,
        }
        info!(room = %self.id, ?setting, "setting changed");
        self.broadcast_room(out);
        Ok(())
    }

    /// Broadcast a chat line, recording it if a game is running.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotInRoom`] for unknown connections.
    pub fn chat(&mut self, connection: ConnectionId, text: &str, out: &mut dyn Emitter) -> Result<(), RoomError> {
        let idx = self.player_index(connection)?;
        let text: String = text.trim().chars().take(MAX_MESSAGE_LEN).collect();
        if text.is_empty() {
            return Ok(());
        }

        let sender = self.players[idx].summary();
        if let (Some(record), Some(map)) = (self.record.as_mut(), self.map.as_ref()) {
            record.push_message(ChatRecord {
                turn: map.turn,
                sender: sender.id,
                username: sender.username.clone(),
                color: sender.color,
                content: text.clone(),
            });
        }
        out.to_room(&self.id, ServerEvent::RoomMessage { sender, text });
        Ok(())
    }

    /// Give up the current game.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotStarted`] outside a game.
    pub fn surrender(&mut self, connection: ConnectionId, out: &mut dyn Emitter) -> Result<(), RoomError> {
        let idx = self.player_index(connection)?;
        let Some(map) = self.map.as_mut() else {
            return Err(RoomError::NotStarted);
        };
        if !self.players[idx].is_contender() {
            return Ok(());
        }

        let id = self.players[idx].id;
        neutralize(map, &mut self.players, id);
        info!(room = %self.id, player = %id, turn = map.turn, "player surrendered");
        out.to_room(
            &self.id,
            ServerEvent::Surrendered {
                player: self.players[idx].summary(),
            },
        );
        Ok(())
    }

    /// Validate and apply an attack, acknowledging to the sender only.
    pub(crate) fn handle_attack(
        &mut self,
        connection: ConnectionId,
        from: Point,
        to: Point,
        half: bool,
        out: &mut dyn Emitter,
    ) {
        let failure = |reason: String| ServerEvent::AttackFailure { from, to, reason };

        let event = match (self.player_index(connection), self.map.as_mut()) {
            (Err(err), _) => failure(err.to_string()),
            (Ok(_), None) => failure(RoomError::NotStarted.to_string()),
            (Ok(idx), Some(map)) => {
                let id = self.players[idx].id;
                match attack(map, &mut self.players, id, AttackOrder { from, to, half }) {
                    Ok(_) => ServerEvent::AttackSuccess { from, to },
                    Err(reason) => failure(reason.to_string()),
                }
            }
        };
        out.to_connection(connection, event);
    }

    fn require_host(&self, connection: ConnectionId) -> Result<usize, RoomError> {
        let idx = self.player_index(connection)?;
        if self.players[idx].is_room_host {
            Ok(idx)
        } else {
            Err(SettingsError::NotHost.into())
        }
    }

    /// Reassign colors to roster positions.
    pub(crate) fn recolor(&mut self) {
        for (idx, player) in self.players.iter_mut().enumerate() {
            player.color = u8::try_from(idx).unwrap_or(u8::MAX);
        }
    }

    /// Make sure exactly one connected player is host.
    pub(crate) fn reassign_host(&mut self) {
        if self.players.iter().any(|p| p.is_room_host && !p.disconnected) {
            return;
        }
        for player in &mut self.players {
            player.is_room_host = false;
        }
        if let Some(next) = self.players.iter_mut().find(|p| !p.disconnected) {
            next.is_room_host = true;
            info!(room = %self.id, host = %next.id, "host reassigned");
        }
    }

    fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_spectator()).count()
    }

    fn recount_votes(&mut self, out: &mut dyn Emitter) {
        self.force_start_num = self
            .players
            .iter()
            .filter(|p| p.force_start && !p.is_spectator())
            .count();
        out.to_room(
            &self.id,
            ServerEvent::ForceStartChanged {
                count: self.force_start_num,
                required: required_votes(self.active_count()),
            },
        );
    }

    fn maybe_start(&mut self, out: &mut dyn Emitter) {
        let active = self.active_count();
        if active >= MIN_PLAYERS_TO_START && self.force_start_num >= required_votes(active) {
            if let Err(err) = self.start_game(out) {
                debug!(room = %self.id, %err, "vote-triggered start failed");
            }
        }
    }
}

//! Headless self-play with random bots.
//!
//! A [`SelfPlay`] seats bots in a [`Room`], starts a game, and each turn
//! lets every contender issue one random attack before ticking. It drives
//! the same command and tick paths as a live room, which makes it useful
//! for soak testing, benchmarks, and producing sample replays.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RoomError, TickError};
use crate::game::invariants::assert_invariants;
use crate::game::{AttackOrder, ConnectionId, GameMap, Player};
use crate::protocol::{ClientCommand, Envelope, NullEmitter, ServerEvent};
use crate::replay::ReplayStore;
use crate::room::{Room, RoomConfig, RoomId, TickOutcome};

/// Chance that a bot sends half its units instead of all of them.
const HALF_CHANCE: f64 = 0.25;

/// How a batch of self-play games is set up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Bots per game.
    pub players: usize,
    /// Turn cap after which a game is stopped without a winner.
    pub max_turns: u32,
    /// Room settings for every game.
    pub room: RoomConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 2,
            max_turns: 2000,
            room: RoomConfig::default(),
        }
    }
}

/// Result of one self-play game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Seed the game was generated from.
    pub seed: u64,
    /// Ticks played.
    pub turns: u32,
    /// Whether a team won before the turn cap.
    pub finished: bool,
    /// Names of the winning team's members.
    pub winners: Vec<String>,
    /// Stored replay, if saving succeeded.
    pub replay_id: Option<String>,
}

/// A room full of random bots.
#[derive(Debug)]
pub struct SelfPlay {
    seed: u64,
    room: Room,
    rng: StdRng,
    max_turns: u32,
    /// Tick output, scanned for the end of the game.
    out: Vec<Envelope>,
    winners: Vec<String>,
}

impl SelfPlay {
    /// Seat `config.players` bots and start a game generated from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError`] if the roster does not fit the settings or
    /// the map cannot be generated.
    pub fn new(seed: u64, config: &SimConfig, replays: Arc<dyn ReplayStore>) -> Result<Self, RoomError> {
        let mut room = Room::new(
            RoomId::from(format!("sim-{seed}")),
            format!("self-play {seed}"),
            config.room,
            replays,
        )
        .with_seed(seed);

        for idx in 0..config.players {
            let connection = ConnectionId(idx as u64 + 1);
            room.join(connection, &format!("bot{}", idx + 1), &mut NullEmitter)?;
        }
        room.start_game(&mut NullEmitter)?;

        Ok(Self {
            seed,
            room,
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            max_turns: config.max_turns,
            out: Vec::new(),
            winners: Vec::new(),
        })
    }

    /// The room being played in.
    #[must_use]
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Let every bot act once, then tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if no game is running or the tick failed.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the tick left the game inconsistent.
    pub fn step(&mut self) -> Result<TickOutcome, TickError> {
        let Some(map) = self.room.map() else {
            return Err(TickError::NoGame);
        };
        let mut orders = Vec::new();
        for player in self.room.players().iter().filter(|p| p.is_contender()) {
            if let Some(order) = choose_order(map, player, &mut self.rng) {
                orders.push((player.connection, order));
            }
        }

        for (connection, order) in orders {
            let command = ClientCommand::Attack {
                from: order.from,
                to: order.to,
                half: order.half,
            };
            self.room.handle_command(connection, command, &mut NullEmitter);
        }

        let outcome = self.room.tick(&mut self.out)?;
        if let Some(map) = self.room.map() {
            assert_invariants(map, self.room.players());
        }
        self.collect_winners();
        Ok(outcome)
    }

    /// Play until a team wins or the turn cap is reached.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if a tick fails.
    pub fn run(mut self) -> Result<GameSummary, TickError> {
        loop {
            let turn = self.room.map().map_or(0, |m| m.turn);
            if turn >= self.max_turns {
                debug!(seed = self.seed, turn, "turn cap reached");
                let replay_id = self.room.end_game(None, &mut NullEmitter);
                return Ok(self.summary(turn, false, replay_id));
            }
            if let TickOutcome::Ended { replay_id } = self.step()? {
                return Ok(self.summary(turn + 1, true, replay_id));
            }
        }
    }

    fn collect_winners(&mut self) {
        for envelope in self.out.drain(..) {
            if let ServerEvent::GameEnded { winners, .. } = envelope.event {
                self.winners = winners.into_iter().map(|w| w.username).collect();
            }
        }
    }

    fn summary(self, turns: u32, finished: bool, replay_id: Option<String>) -> GameSummary {
        GameSummary {
            seed: self.seed,
            turns,
            finished,
            winners: self.winners,
            replay_id,
        }
    }
}

/// Pick a random owned tile that can move units and a random passable
/// neighbour to send them to.
pub fn choose_order<R: Rng + ?Sized>(map: &GameMap, player: &Player, rng: &mut R) -> Option<AttackOrder> {
    let sources: Vec<_> = player
        .land
        .iter()
        .copied()
        .filter(|&p| map.get(p).is_some_and(|b| b.unit > 1))
        .collect();
    let from = *sources.choose(rng)?;

    let targets: Vec<_> = from
        .orthogonal()
        .into_iter()
        .filter(|&p| map.get(p).is_some_and(|b| b.tile_type.is_passable()))
        .collect();
    let to = *targets.choose(rng)?;

    Some(AttackOrder {
        from,
        to,
        half: rng.gen_bool(HALF_CHANCE),
    })
}

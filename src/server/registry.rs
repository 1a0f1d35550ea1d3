//! Process-wide room directory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::error::SettingsError;
use crate::protocol::Envelope;
use crate::replay::ReplayStore;
use crate::room::{Room, RoomConfig, RoomId, validate_room_name};
use crate::server::{RoomActor, RoomHandle};

/// A room as listed to clients browsing for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room identifier.
    pub id: RoomId,
    /// Display name.
    pub room_name: String,
    /// Players in the roster, spectators included.
    pub players: usize,
    /// Roster capacity.
    pub max_players: usize,
    /// Whether a game is running.
    pub game_started: bool,
}

impl RoomSummary {
    /// Summarize `room`.
    #[must_use]
    pub fn of(room: &Room) -> Self {
        Self {
            id: room.id().clone(),
            room_name: room.room_name().to_string(),
            players: room.players().len(),
            max_players: room.config().max_players,
            game_started: room.game_started(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    handle: RoomHandle,
    summary: RoomSummary,
}

/// Shared directory of running rooms.
///
/// Clones share the same directory. Each operation takes the lock once
/// and never holds it across an await.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<RoomId, Entry>>>,
    replays: Arc<dyn ReplayStore>,
    out: UnboundedSender<Envelope>,
}

impl RoomRegistry {
    /// An empty registry whose rooms store replays in `replays` and send
    /// events to `out`.
    #[must_use]
    pub fn new(replays: Arc<dyn ReplayStore>, out: UnboundedSender<Envelope>) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            replays,
            out,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoomId, Entry>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a room and spawn its task on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the name or the settings are invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn create(
        &self,
        room_name: &str,
        config: RoomConfig,
        keep_alive: bool,
    ) -> Result<RoomHandle, SettingsError> {
        let room_name = validate_room_name(room_name)?;
        config.validate()?;

        let mut rooms = self.lock();
        let id = loop {
            let id = RoomId::random();
            if !rooms.contains_key(&id) {
                break id;
            }
        };
        let room = Room::new(id.clone(), room_name, config, Arc::clone(&self.replays))
            .with_keep_alive(keep_alive);
        let summary = RoomSummary::of(&room);
        let (actor, handle) = RoomActor::new(room, self.out.clone());
        rooms.insert(
            id.clone(),
            Entry {
                handle: handle.clone(),
                summary,
            },
        );
        drop(rooms);

        tokio::spawn(actor.with_registry(self.clone()).run());
        info!(room = %id, keep_alive, "room created");
        Ok(handle)
    }

    /// Look up a room.
    #[must_use]
    pub fn get(&self, id: &RoomId) -> Option<RoomHandle> {
        self.lock().get(id).map(|entry| entry.handle.clone())
    }

    /// Drop a room from the directory, returning its handle.
    pub fn remove(&self, id: &RoomId) -> Option<RoomHandle> {
        let removed = self.lock().remove(id).map(|entry| entry.handle);
        if removed.is_some() {
            info!(room = %id, "room removed");
        }
        removed
    }

    /// Refresh the listing for `room`, if it is still registered.
    pub fn update(&self, room: &Room) {
        if let Some(entry) = self.lock().get_mut(room.id()) {
            entry.summary = RoomSummary::of(room);
        }
    }

    /// Every registered room, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self.lock().values().map(|e| e.summary.clone()).collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    /// Number of registered rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no room is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Per-room settings.

// Map sides are derived from ratios in floating point
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Game speeds a host may pick.
pub const ALLOWED_SPEEDS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// Smallest `max_players` a room accepts.
pub const MIN_PLAYERS: usize = 2;

/// Largest `max_players` a room accepts.
pub const MAX_PLAYERS: usize = 16;

/// Smallest generated map side.
pub const MIN_MAP_SIDE: u16 = 10;

/// Largest base map side before ratios are applied.
pub const MAX_MAP_BASE: u32 = 50;

/// Tick length at speed 1.
pub const BASE_TICK: Duration = Duration::from_millis(500);

/// Longest room name, in characters.
pub const MAX_ROOM_NAME: usize = 32;

/// Settings a host can change in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Roster capacity, spectators included.
    pub max_players: usize,
    /// Tick rate multiplier, one of [`ALLOWED_SPEEDS`].
    pub game_speed: f64,
    /// Width ratio in `(0, 1]`.
    pub map_width: f64,
    /// Height ratio in `(0, 1]`.
    pub map_height: f64,
    /// Mountain ratio in `[0, 1]`.
    pub mountain: f64,
    /// City ratio in `[0, 1]`.
    pub city: f64,
    /// Swamp ratio in `[0, 1]`.
    pub swamp: f64,
    /// Hide tiles outside each player's vision.
    pub fog_of_war: bool,
    /// Eliminated players see the whole map.
    pub death_spectator: bool,
    /// Every king is visible to everyone.
    pub warring_states: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            game_speed: 1.0,
            map_width: 0.5,
            map_height: 0.5,
            mountain: 0.5,
            city: 0.5,
            swamp: 0.0,
            fog_of_war: true,
            death_spectator: true,
            warring_states: false,
        }
    }
}

/// One settings change, as sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "setting", content = "value", rename_all = "snake_case")]
pub enum Setting {
    /// See [`RoomConfig::game_speed`].
    GameSpeed(f64),
    /// See [`RoomConfig::map_width`].
    MapWidth(f64),
    /// See [`RoomConfig::map_height`].
    MapHeight(f64),
    /// See [`RoomConfig::mountain`].
    Mountain(f64),
    /// See [`RoomConfig::city`].
    City(f64),
    /// See [`RoomConfig::swamp`].
    Swamp(f64),
    /// See [`RoomConfig::max_players`].
    MaxPlayers(usize),
    /// Rename the room.
    RoomName(String),
    /// See [`RoomConfig::fog_of_war`].
    FogOfWar(bool),
    /// See [`RoomConfig::death_spectator`].
    DeathSpectator(bool),
    /// See [`RoomConfig::warring_states`].
    WarringStates(bool),
}

fn check_ratio(name: &'static str, value: f64, allow_zero: bool) -> Result<f64, SettingsError> {
    let above_min = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if above_min && value <= 1.0 {
        Ok(value)
    } else {
        Err(SettingsError::InvalidRatio { name, value })
    }
}

/// Trim and validate a room name.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidRoomName`] if the trimmed name is empty
/// or longer than [`MAX_ROOM_NAME`] characters.
pub fn validate_room_name(name: &str) -> Result<String, SettingsError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_ROOM_NAME {
        return Err(SettingsError::InvalidRoomName);
    }
    Ok(name.to_string())
}

impl RoomConfig {
    /// Apply one change. `roster` is the current number of players, which
    /// `max_players` may not drop below.
    ///
    /// [`Setting::RoomName`] is not part of the config and is ignored here.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] and leaves the config untouched if the
    /// value is out of range.
    pub fn apply(&mut self, setting: &Setting, roster: usize) -> Result<(), SettingsError> {
        match *setting {
            Setting::GameSpeed(speed) => {
                if !ALLOWED_SPEEDS.iter().any(|s| (s - speed).abs() < f64::EPSILON) {
                    return Err(SettingsError::InvalidSpeed(speed));
                }
                self.game_speed = speed;
            }
            Setting::MapWidth(v) => self.map_width = check_ratio("map_width", v, false)?,
            Setting::MapHeight(v) => self.map_height = check_ratio("map_height", v, false)?,
            Setting::Mountain(v) => self.mountain = check_ratio("mountain", v, true)?,
            Setting::City(v) => self.city = check_ratio("city", v, true)?,
            Setting::Swamp(v) => self.swamp = check_ratio("swamp", v, true)?,
            Setting::MaxPlayers(value) => {
                let min = MIN_PLAYERS.max(roster);
                if value < min || value > MAX_PLAYERS {
                    return Err(SettingsError::InvalidMaxPlayers { min, value });
                }
                self.max_players = value;
            }
            Setting::FogOfWar(v) => self.fog_of_war = v,
            Setting::DeathSpectator(v) => self.death_spectator = v,
            Setting::WarringStates(v) => self.warring_states = v,
            Setting::RoomName(_) => {}
        }
        Ok(())
    }

    /// Check every field, e.g. after loading from a file.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut scratch = *self;
        for setting in [
            Setting::GameSpeed(self.game_speed),
            Setting::MapWidth(self.map_width),
            Setting::MapHeight(self.map_height),
            Setting::Mountain(self.mountain),
            Setting::City(self.city),
            Setting::Swamp(self.swamp),
            Setting::MaxPlayers(self.max_players),
        ] {
            scratch.apply(&setting, 0)?;
        }
        Ok(())
    }

    /// Time between ticks at the configured speed.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        BASE_TICK.div_f64(self.game_speed)
    }

    /// Map size for a game with `contenders` non-spectating players.
    #[must_use]
    pub fn map_dimensions(&self, contenders: usize) -> (u16, u16) {
        let contenders = u32::try_from(contenders).unwrap_or(u32::MAX);
        let base = contenders.saturating_mul(5).saturating_add(10).min(MAX_MAP_BASE);
        // Ratios are within (0, 1], so a side never exceeds MAX_MAP_BASE.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let side = |ratio: f64| {
            let scaled = (f64::from(base) * ratio).ceil() as u16;
            scaled.max(MIN_MAP_SIDE)
        };
        (side(self.map_width), side(self.map_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RoomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_players, 8);
        assert!(config.fog_of_war);
        assert!(!config.warring_states);
    }

    #[test]
    fn test_tick_interval() {
        let mut config = RoomConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        config.apply(&Setting::GameSpeed(2.0), 0).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        config.apply(&Setting::GameSpeed(0.25), 0).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_unlisted_speed() {
        let mut config = RoomConfig::default();
        assert_eq!(
            config.apply(&Setting::GameSpeed(1.25), 0),
            Err(SettingsError::InvalidSpeed(1.25))
        );
        assert_eq!(config, RoomConfig::default());
    }

    #[test]
    fn test_ratio_bounds() {
        let mut config = RoomConfig::default();
        assert!(config.apply(&Setting::Mountain(0.0), 0).is_ok());
        assert!(config.apply(&Setting::Swamp(1.0), 0).is_ok());
        assert!(config.apply(&Setting::City(1.5), 0).is_err());
        assert!(config.apply(&Setting::MapWidth(0.0), 0).is_err());
        assert!(config.apply(&Setting::MapHeight(-0.1), 0).is_err());
    }

    #[test]
    fn test_max_players_floor_is_roster() {
        let mut config = RoomConfig::default();
        assert_eq!(
            config.apply(&Setting::MaxPlayers(3), 5),
            Err(SettingsError::InvalidMaxPlayers { min: 5, value: 3 })
        );
        assert!(config.apply(&Setting::MaxPlayers(17), 0).is_err());
        assert!(config.apply(&Setting::MaxPlayers(1), 0).is_err());
        assert!(config.apply(&Setting::MaxPlayers(16), 5).is_ok());
        assert_eq!(config.max_players, 16);
    }

    #[test]
    fn test_room_name_validation() {
        assert_eq!(validate_room_name("  lobby  ").unwrap(), "lobby");
        assert!(validate_room_name("   ").is_err());
        assert!(validate_room_name(&"x".repeat(33)).is_err());
        assert!(validate_room_name(&"é".repeat(32)).is_ok());
    }

    #[test]
    fn test_map_dimensions() {
        let config = RoomConfig::default();
        // base = 20, 20 * 0.5 = 10
        assert_eq!(config.map_dimensions(2), (10, 10));
        // base = 40
        assert_eq!(config.map_dimensions(6), (20, 20));
        // base capped at 50
        assert_eq!(config.map_dimensions(16), (25, 25));

        let config = RoomConfig {
            map_width: 1.0,
            map_height: 0.1,
            ..RoomConfig::default()
        };
        assert_eq!(config.map_dimensions(8), (50, 10));
    }

    #[test]
    fn test_setting_wire_format() {
        let json = serde_json::to_string(&Setting::GameSpeed(2.0)).unwrap();
        assert_eq!(json, r#"{"setting":"game_speed","value":2.0}"#);
        let back: Setting = serde_json::from_str(r#"{"setting":"fog_of_war","value":false}"#).unwrap();
        assert_eq!(back, Setting::FogOfWar(false));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RoomConfig = serde_json::from_str(r#"{"swamp": 0.2}"#).unwrap();
        assert_eq!(config.max_players, 8);
        assert!((config.swamp - 0.2).abs() < f64::EPSILON);
    }
}

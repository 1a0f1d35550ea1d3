//! Stepping through a recorded game.

use crate::diff::apply_diff;
use crate::error::ReplayError;
use crate::game::TileView;
use crate::replay::{GameRecord, TurnRecord};
use crate::room::LeaderboardEntry;

/// Rebuilds the grid at any recorded turn.
///
/// Moving forward applies one patch per turn. Moving backward replays
/// from the first turn, since patches only encode the forward direction.
#[derive(Debug)]
pub struct ReplayCursor<'a> {
    record: &'a GameRecord,
    index: usize,
    grid: Vec<TileView>,
}

impl<'a> ReplayCursor<'a> {
    /// Open a cursor positioned on the first recorded turn.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::TurnOutOfRange`] if nothing was recorded, or
    /// [`ReplayError::Corrupt`] if the first patch is not a full frame.
    pub fn new(record: &'a GameRecord) -> Result<Self, ReplayError> {
        let first = record
            .turns
            .first()
            .ok_or(ReplayError::TurnOutOfRange { turn: 0, last: 0 })?;
        let grid = apply_diff(None, &first.diff)?;
        Ok(Self {
            record,
            index: 0,
            grid,
        })
    }

    fn current(&self) -> &'a TurnRecord {
        &self.record.turns[self.index]
    }

    /// Turn the cursor is on.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.current().turn
    }

    /// Flattened grid at the current turn.
    #[must_use]
    pub fn grid(&self) -> &[TileView] {
        &self.grid
    }

    /// Standings at the current turn.
    #[must_use]
    pub fn leaderboard(&self) -> &'a [LeaderboardEntry] {
        &self.current().leaderboard
    }

    /// Advance one turn. Returns `false` at the end of the record.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] if the next patch does not apply.
    pub fn step_forward(&mut self) -> Result<bool, ReplayError> {
        let Some(next) = self.record.turns.get(self.index + 1) else {
            return Ok(false);
        };
        self.grid = apply_diff(Some(&self.grid), &next.diff)?;
        self.index += 1;
        Ok(true)
    }

    /// Move to `turn`, forward or backward.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::TurnOutOfRange`] if `turn` was not recorded,
    /// or [`ReplayError::Corrupt`] if a patch on the way does not apply.
    pub fn seek(&mut self, turn: u32) -> Result<(), ReplayError> {
        let target = self
            .record
            .turns
            .binary_search_by_key(&turn, |t| t.turn)
            .map_err(|_| ReplayError::TurnOutOfRange {
                turn,
                last: self.record.last_turn().unwrap_or(0),
            })?;

        if target < self.index {
            *self = Self::new(self.record)?;
        }
        while self.index < target {
            self.step_forward()?;
        }
        Ok(())
    }
}

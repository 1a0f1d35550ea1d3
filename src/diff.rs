//! Incremental encoding of flattened grid snapshots.
//!
//! A patch is a sequence of [`DiffEntry`] values: a run of cells unchanged
//! since the previous snapshot, or one literal [`TileView`]. Runs and
//! literals together cover the grid exactly once, in row-major order.
//!
//! ```text
//! previous: [A, A, B, C, C]
//! next:     [A, A, D, C, C]
//! patch:    [Same(2), Changed(D), Same(2)]
//! ```
//!
//! One [`MapDiff`] is kept per player for their fogged view and one per
//! game for the unfogged replay trace.

use serde::{Deserialize, Serialize};

use crate::error::DiffError;
use crate::game::TileView;

/// One element of a patch.
///
/// Serialized untagged: a run is a bare number, a literal is a tile object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffEntry {
    /// This many cells are unchanged.
    Same(usize),
    /// The next cell, verbatim.
    Changed(TileView),
}

/// Encoder state: the last snapshot sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapDiff {
    previous: Option<Vec<TileView>>,
}

impl MapDiff {
    /// Create an encoder with no history; the first patch is a full frame.
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// The last snapshot encoded, if any.
    #[must_use]
    pub fn previous(&self) -> Option<&[TileView]> {
        self.previous.as_deref()
    }

    /// Forget history so the next patch is a full frame.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Encode `next` against the previous snapshot and remember it.
    ///
    /// Without a previous snapshot of the same length every cell is
    /// emitted as a literal.
    pub fn patch(&mut self, next: Vec<TileView>) -> Vec<DiffEntry> {
        let entries = match self.previous.as_deref() {
            Some(prev) if prev.len() == next.len() => encode(prev, &next),
            _ => next.iter().copied().map(DiffEntry::Changed).collect(),
        };
        self.previous = Some(next);
        entries
    }
}

fn encode(prev: &[TileView], next: &[TileView]) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut run = 0;

    for (old, new) in prev.iter().zip(next) {
        if old == new {
            run += 1;
        } else {
            if run > 0 {
                entries.push(DiffEntry::Same(run));
                run = 0;
            }
            entries.push(DiffEntry::Changed(*new));
        }
    }
    if run > 0 {
        entries.push(DiffEntry::Same(run));
    }

    entries
}

/// Rebuild a snapshot from its predecessor and a patch.
///
/// A patch consisting only of literals is a full frame: it replaces the
/// base at whatever length it has, an empty patch included, and does not
/// need `previous`. [`MapDiff::patch`] emits one whenever the grid size
/// changes.
///
/// # Errors
///
/// Returns [`DiffError`] if a patch containing runs overruns or falls short
/// of the previous grid, or has no previous grid to copy from.
pub fn apply_diff(
    previous: Option<&[TileView]>,
    entries: &[DiffEntry],
) -> Result<Vec<TileView>, DiffError> {
    let full_frame = entries.iter().all(|e| matches!(e, DiffEntry::Changed(_)));
    if full_frame {
        return Ok(entries
            .iter()
            .filter_map(|e| match e {
                DiffEntry::Changed(view) => Some(*view),
                DiffEntry::Same(_) => None,
            })
            .collect());
    }

    let prev = previous.ok_or(DiffError::MissingBase)?;
    let len = prev.len();
    let mut next = Vec::with_capacity(len);

    for entry in entries {
        let at = next.len();
        match *entry {
            DiffEntry::Same(run) => {
                let end = at
                    .checked_add(run)
                    .filter(|&end| end <= len)
                    .ok_or(DiffError::Overrun { len, at })?;
                next.extend_from_slice(&prev[at..end]);
            }
            DiffEntry::Changed(view) => {
                if at >= len {
                    return Err(DiffError::Overrun { len, at });
                }
                next.push(view);
            }
        }
    }

    if next.len() != len {
        return Err(DiffError::Incomplete {
            covered: next.len(),
            len,
        });
    }
    Ok(next)
}

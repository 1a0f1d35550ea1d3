#![no_main]

//! Grid patch fuzzer.
//!
//! Encodes arbitrary snapshot pairs and checks they rebuild exactly, then
//! feeds arbitrary patches to the decoder, which must fail cleanly.

use arbitrary::Arbitrary;
use conquer::{DiffEntry, MapDiff, TileType, TileView, apply_diff};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Cell {
    kind: u8,
    color: Option<u8>,
    unit: Option<u16>,
}

impl Cell {
    fn view(&self) -> TileView {
        let tile_type = match self.kind % 7 {
            0 => TileType::King,
            1 => TileType::City,
            2 => TileType::Plain,
            3 => TileType::Mountain,
            4 => TileType::Swamp,
            5 => TileType::Fog,
            _ => TileType::Obstacle,
        };
        TileView {
            tile_type,
            color: self.color,
            unit: self.unit.map(u32::from),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum RawEntry {
    Same(u16),
    Changed(Cell),
}

#[derive(Arbitrary, Debug)]
struct DiffInput {
    previous: Vec<Cell>,
    next: Vec<Cell>,
    raw: Vec<RawEntry>,
}

fuzz_target!(|input: DiffInput| {
    let previous: Vec<TileView> = input.previous.iter().map(Cell::view).collect();
    let mut next: Vec<TileView> = input.next.iter().map(Cell::view).collect();
    next.resize(previous.len(), TileView::FOG);

    let mut encoder = MapDiff::new();
    encoder.patch(previous.clone());
    let entries = encoder.patch(next.clone());
    assert!(entries.len() <= next.len());
    assert_eq!(apply_diff(Some(&previous), &entries).ok(), Some(next));

    // Arbitrary patches may be rejected but must never panic.
    let raw: Vec<DiffEntry> = input
        .raw
        .iter()
        .map(|e| match e {
            RawEntry::Same(run) => DiffEntry::Same(usize::from(*run)),
            RawEntry::Changed(cell) => DiffEntry::Changed(cell.view()),
        })
        .collect();
    if let Ok(grid) = apply_diff(Some(&previous), &raw) {
        let all_literals = raw.iter().all(|e| matches!(e, DiffEntry::Changed(_)));
        assert!(all_literals || grid.len() == previous.len());
    }
});

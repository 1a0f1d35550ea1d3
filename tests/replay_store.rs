//! Replays written by self-play games and read back from disk.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use conquer::replay::ReplayCursor;
use conquer::room::RoomConfig;
use conquer::{DiffEntry, FileReplayStore, GameRecord, ReplayError, ReplayStore, SelfPlay, SimConfig};

fn config() -> SimConfig {
    SimConfig {
        players: 2,
        max_turns: 60,
        room: RoomConfig {
            map_width: 1.0,
            map_height: 1.0,
            ..RoomConfig::default()
        },
    }
}

/// Play a short game into `store`, trying seeds until a map fits.
fn played(store: &Arc<FileReplayStore>) -> (String, u32) {
    for seed in 0..20 {
        let Ok(game) = SelfPlay::new(seed, &config(), Arc::clone(store) as Arc<dyn ReplayStore>) else {
            continue;
        };
        let summary = game.run().unwrap();
        return (summary.replay_id.unwrap(), summary.turns);
    }
    panic!("no seed produced a valid map");
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileReplayStore::new(dir.path().join("replays")));
    let (id, turns) = played(&store);

    let path = dir.path().join("replays").join(format!("{id}.json"));
    assert!(path.exists());

    let record = store.load(&id).unwrap();
    assert_eq!(record, GameRecord::load_file(&path).unwrap());
    assert_eq!(record.players.len(), 2);
    assert_eq!(record.turns.len(), usize::try_from(turns).unwrap());
    assert!(record.turns.windows(2).all(|w| w[1].turn == w[0].turn + 1));

    let area = usize::from(record.map_width) * usize::from(record.map_height);
    let mut cursor = ReplayCursor::new(&record).unwrap();
    assert_eq!(cursor.grid().len(), area);
    while cursor.step_forward().unwrap() {
        assert_eq!(cursor.grid().len(), area);
    }
    assert_eq!(Some(cursor.turn()), record.last_turn());
}

#[test]
fn test_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileReplayStore::new(dir.path());
    assert!(matches!(
        store.load("0123456789abcdef0123456789abcdef"),
        Err(ReplayError::NotFound(_))
    ));
    assert!(matches!(store.load("../secret"), Err(ReplayError::NotFound(_))));
}

#[test]
fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("deadbeef.json"), "{ not json").unwrap();
    let store = FileReplayStore::new(dir.path());
    assert!(matches!(store.load("deadbeef"), Err(ReplayError::Json(_))));
}

#[test]
fn test_damaged_trace_fails_to_replay() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileReplayStore::new(dir.path()));
    let (id, _) = played(&store);

    let mut record = store.load(&id).unwrap();
    let area = usize::from(record.map_width) * usize::from(record.map_height);
    record.turns[1].diff = vec![DiffEntry::Same(area + 1)];

    let mut cursor = ReplayCursor::new(&record).unwrap();
    assert!(matches!(cursor.step_forward(), Err(ReplayError::Corrupt(_))));
}

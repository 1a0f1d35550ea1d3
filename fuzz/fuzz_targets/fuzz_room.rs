#![no_main]

//! Room command fuzzer.
//!
//! Drives a room with an arbitrary interleaving of client commands and
//! ticks. The room must never panic and its ownership bookkeeping must
//! stay consistent whatever the clients send.

use std::sync::Arc;

use arbitrary::Arbitrary;
use conquer::game::invariants::check_invariants;
use conquer::room::Setting;
use conquer::{
    ClientCommand, ConnectionId, MemoryReplayStore, Point, Room, RoomConfig, RoomId, TickOutcome,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Action {
    Join,
    Leave,
    ForceStart,
    Team(u8),
    Host(u8),
    Ratio(u8, u8),
    Attack { fx: u8, fy: u8, tx: u8, ty: u8, half: bool },
    Surrender,
    Chat(String),
    Tick,
}

#[derive(Arbitrary, Debug)]
struct RoomInput {
    seed: u64,
    steps: Vec<(u8, Action)>,
}

fuzz_target!(|input: RoomInput| {
    let mut room = Room::new(
        RoomId::from("fuzz"),
        "fuzz".into(),
        RoomConfig::default(),
        Arc::new(MemoryReplayStore::new()),
    )
    .with_seed(input.seed);
    let mut out = Vec::new();

    for (who, action) in input.steps.into_iter().take(512) {
        let connection = ConnectionId(u64::from(who % 6));
        let command = match action {
            Action::Join => ClientCommand::Join { username: format!("c{}", connection.0) },
            Action::Leave => ClientCommand::Leave,
            Action::ForceStart => ClientCommand::ForceStart,
            Action::Team(team) => ClientCommand::ChangeTeam { team: team % 20 },
            Action::Host(idx) => match room.players().get(usize::from(idx) % 8) {
                Some(p) => ClientCommand::ChangeHost { player_id: p.id },
                None => continue,
            },
            Action::Ratio(which, value) => {
                let ratio = f64::from(value) / 200.0;
                let setting = match which % 5 {
                    0 => Setting::Mountain(ratio),
                    1 => Setting::City(ratio),
                    2 => Setting::Swamp(ratio),
                    3 => Setting::MapWidth(ratio),
                    _ => Setting::MapHeight(ratio),
                };
                ClientCommand::ChangeSetting(setting)
            }
            Action::Attack { fx, fy, tx, ty, half } => ClientCommand::Attack {
                from: Point::new(i32::from(fx % 60), i32::from(fy % 60)),
                to: Point::new(i32::from(tx % 60), i32::from(ty % 60)),
                half,
            },
            Action::Surrender => ClientCommand::Surrender,
            Action::Chat(text) => ClientCommand::PlayerMessage { text },
            Action::Tick => {
                if room.game_started() {
                    let outcome = room.tick(&mut out);
                    assert!(outcome.is_ok(), "tick failed: {outcome:?}");
                    if let Ok(TickOutcome::Ended { .. }) = outcome {
                        assert!(!room.game_started());
                    }
                }
                continue;
            }
        };
        room.handle_command(connection, command, &mut out);
        out.clear();

        if let Some(map) = room.map() {
            let violations = check_invariants(map, room.players());
            assert!(violations.is_empty(), "{violations:?}");
        }
        assert!(room.players().iter().filter(|p| p.is_room_host).count() <= 1);
    }
});

//! Replay command implementation.

use super::CliError;
use conquer::GameRecord;
use conquer::replay::{ReplayCursor, render_snapshot};
use std::path::Path;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the requested turn is
/// not in the recording.
pub(crate) fn execute(path: &Path, turn: Option<u32>, all: bool) -> Result<(), CliError> {
    let record = GameRecord::load_file(path)?;
    let mut cursor = ReplayCursor::new(&record)?;
    let target = match turn {
        Some(turn) => turn,
        None => record.last_turn().unwrap_or(0),
    };

    println!(
        "{} on {} ({}x{}), {} players",
        record.room_name,
        record.map_name,
        record.map_width,
        record.map_height,
        record.players.len()
    );

    if all {
        loop {
            print_turn(&record, &cursor);
            if cursor.turn() >= target || !cursor.step_forward()? {
                break;
            }
        }
    } else {
        cursor.seek(target)?;
        print_turn(&record, &cursor);
    }

    if cursor.turn() == record.last_turn().unwrap_or(0) {
        let winners: Vec<&str> = record.winners.iter().map(|w| w.username.as_str()).collect();
        if winners.is_empty() {
            println!("No winner");
        } else {
            println!("Winners: {}", winners.join(", "));
        }
    }
    Ok(())
}

fn print_turn(record: &GameRecord, cursor: &ReplayCursor<'_>) {
    print!(
        "{}",
        render_snapshot(cursor.grid(), record.map_width, cursor.turn(), cursor.leaderboard())
    );
    for message in record
        .messages_until(cursor.turn())
        .filter(|m| m.turn == cursor.turn())
    {
        println!("<{}> {}", message.username, message.content);
    }
}

//! ASCII renderer for terminal viewing with ANSI colors.

use std::fmt::Write;

use crate::game::{TileType, TileView};
use crate::room::LeaderboardEntry;

/// ANSI color codes, indexed by player color.
const PLAYER_COLORS: [&str; 16] = [
    "\x1b[31m", // Red
    "\x1b[34m", // Blue
    "\x1b[32m", // Green
    "\x1b[33m", // Yellow
    "\x1b[35m", // Magenta
    "\x1b[36m", // Cyan
    "\x1b[91m", // Bright Red
    "\x1b[94m", // Bright Blue
    "\x1b[92m", // Bright Green
    "\x1b[93m", // Bright Yellow
    "\x1b[95m", // Bright Magenta
    "\x1b[96m", // Bright Cyan
    "\x1b[38;5;208m", // Orange
    "\x1b[38;5;129m", // Purple
    "\x1b[38;5;94m",  // Brown
    "\x1b[38;5;244m", // Grey
];

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const WHITE: &str = "\x1b[37m";
const GRAY: &str = "\x1b[90m";

/// Render a flattened grid with ANSI colors.
///
/// Output format:
/// ```text
/// Turn 42                           [#0: 37/12] [#1: 30/9]
/// ┌─────────────────────┐
/// │ . . M . C . . . . . │
/// │ . K 3 2 . . # . ? ? │
/// └─────────────────────┘
///
/// Legend: K=King  C=City  M=Mountain  ~=Swamp  #=Obstacle  ?=Fog  digit=Army
/// ```
///
/// Scores in the header are army/land per color, strongest first.
#[must_use]
pub fn render_snapshot(
    grid: &[TileView],
    width: u16,
    turn: u32,
    leaderboard: &[LeaderboardEntry],
) -> String {
    let mut output = String::new();
    let width = usize::from(width).max(1);

    render_header(&mut output, turn, leaderboard);

    let border: String = "─".repeat(width * 2 + 1);
    let _ = writeln!(output, "┌{border}┐");
    for row in grid.chunks(width) {
        output.push_str("│ ");
        for view in row {
            render_tile(&mut output, view);
            output.push(' ');
        }
        output.push_str("│\n");
    }
    let _ = writeln!(output, "└{border}┘");

    output.push_str(
        "\nLegend: K=King  C=City  M=Mountain  ~=Swamp  #=Obstacle  ?=Fog  digit=Army\n",
    );
    output
}

fn render_header(output: &mut String, turn: u32, leaderboard: &[LeaderboardEntry]) {
    let title = format!("Turn {turn}");
    output.push_str(&title);
    output.push_str(&" ".repeat(34usize.saturating_sub(title.len())));
    for entry in leaderboard {
        let color = player_color(Some(entry.color));
        let _ = write!(output, "{color}[#{}: {}/{}]{RESET} ", entry.color, entry.army, entry.land);
    }
    output.push('\n');
}

fn render_tile(output: &mut String, view: &TileView) {
    let symbol = match view.tile_type {
        TileType::King => 'K',
        TileType::City => 'C',
        TileType::Mountain => {
            let _ = write!(output, "{WHITE}{BOLD}M{RESET}");
            return;
        }
        TileType::Swamp => '~',
        TileType::Fog => {
            let _ = write!(output, "{GRAY}?{RESET}");
            return;
        }
        TileType::Obstacle => {
            let _ = write!(output, "{GRAY}#{RESET}");
            return;
        }
        TileType::Plain => match (view.color, view.unit) {
            (Some(_), Some(unit)) => army_to_char(unit),
            _ => '.',
        },
    };

    match view.color {
        Some(color) => {
            let _ = write!(output, "{}{symbol}{RESET}", player_color(Some(color)));
        }
        None => {
            let _ = write!(output, "{GRAY}{symbol}{RESET}");
        }
    }
}

/// Convert army count to a display character.
fn army_to_char(army: u32) -> char {
    match army {
        0 => '.',
        1..=9 => char::from_digit(army, 10).unwrap_or('9'),
        _ => '+',
    }
}

fn player_color(color: Option<u8>) -> &'static str {
    color
        .and_then(|c| PLAYER_COLORS.get(usize::from(c)))
        .copied()
        .unwrap_or(WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in s.chars() {
            match (in_escape, c) {
                (false, '\x1b') => in_escape = true,
                (true, 'm') => in_escape = false,
                (false, _) => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_render_shapes() {
        let grid = vec![
            TileView {
                tile_type: TileType::King,
                color: Some(0),
                unit: Some(3),
            },
            TileView {
                tile_type: TileType::Plain,
                color: Some(0),
                unit: Some(12),
            },
            TileView::OBSTACLE,
            TileView::FOG,
        ];
        let board = [LeaderboardEntry {
            color: 0,
            team: 1,
            army: 15,
            land: 2,
        }];

        let text = strip_ansi(&render_snapshot(&grid, 2, 7, &board));
        assert!(text.starts_with("Turn 7"));
        assert!(text.contains("[#0: 15/2]"));
        assert!(text.contains("│ K + │"));
        assert!(text.contains("│ # ? │"));
    }

    #[test]
    fn test_army_chars() {
        assert_eq!(army_to_char(0), '.');
        assert_eq!(army_to_char(7), '7');
        assert_eq!(army_to_char(10), '+');
    }
}

//! Mapgen command implementation.

use super::{CliError, seed_or_clock};
use conquer::game::mapgen::TerrainTargets;
use conquer::game::{GenerationParams, full_view, generate_map};
use conquer::replay::render_snapshot;
use conquer::room::compute_leaderboard;
use conquer::{ConnectionId, Player, PlayerId};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Execute the mapgen command.
///
/// # Errors
///
/// Returns an error if the arguments are out of range or no king layout
/// was found.
pub(crate) fn execute(params: &GenerationParams, players: usize, seed: Option<u64>) -> Result<(), CliError> {
    for (name, ratio) in [("mountain", params.mountain), ("city", params.city), ("swamp", params.swamp)] {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(CliError::Usage(format!("{name} ratio must be within [0, 1]")));
        }
    }
    let players = u8::try_from(players)
        .ok()
        .filter(|n| (1..=16).contains(n))
        .ok_or_else(|| CliError::Usage("players must be between 1 and 16".into()))?;

    let seed = seed_or_clock(seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut roster: Vec<Player> = (0..players)
        .map(|i| Player::new(PlayerId::new(), ConnectionId(u64::from(i)), format!("p{i}"), i, i + 1))
        .collect();
    let map = generate_map(params, &mut roster, &mut rng)?;

    let board = compute_leaderboard(&map, &roster);
    print!("{}", render_snapshot(&full_view(&map, &roster), map.width(), 0, &board));

    let targets = TerrainTargets::from_ratios(map.area(), params.mountain, params.city, params.swamp);
    println!();
    println!("Seed: {seed}");
    println!("Mountains: {}/{}", map.mountain_count, targets.mountains);
    println!("Cities:    {}/{}", map.city_count, targets.cities);
    println!("Swamps:    {}/{}", map.swamp_count, targets.swamps);
    for player in &roster {
        if let Some(king) = player.king {
            println!("King of {} (color {}): {king}", player.username, player.color);
        }
    }
    Ok(())
}

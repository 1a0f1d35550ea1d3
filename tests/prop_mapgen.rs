//! Property-based tests for map generation.
//!
//! Every generated map must keep its open terrain connected and its kings
//! apart, whatever the terrain ratios.
//! Run with: cargo test --release prop_mapgen

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use conquer::game::connectivity::largest_open_component;
use conquer::game::invariants::check_invariants;
use conquer::game::mapgen::{KING_MIN_DISTANCE, TerrainTargets};
use conquer::game::{GenerationParams, Player, PlayerId, TileType, generate_map};
use conquer::{ConnectionId, GenerationError};

fn roster(n: u8) -> Vec<Player> {
    (0..n)
        .map(|i| Player::new(PlayerId::new(), ConnectionId(u64::from(i)), format!("p{i}"), i, i + 1))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Open cells form one component and obstacle counts never exceed
    /// their targets.
    #[test]
    fn prop_open_terrain_is_connected(
        width in 10u16..30,
        height in 10u16..30,
        mountain in 0.0f64..=1.0,
        city in 0.0f64..=1.0,
        swamp in 0.0f64..=1.0,
        players in 1u8..=4,
        seed in any::<u64>()
    ) {
        let params = GenerationParams { width, height, mountain, city, swamp };
        let mut players = roster(players);
        let mut rng = StdRng::seed_from_u64(seed);

        let map = match generate_map(&params, &mut players, &mut rng) {
            Ok(map) => map,
            Err(GenerationError::KingPlacement { .. }) => return Ok(()),
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };

        let obstacles = map.blocks().iter().filter(|b| b.tile_type.is_obstacle()).count();
        prop_assert_eq!(largest_open_component(&map), map.area() - obstacles);

        let targets = TerrainTargets::from_ratios(map.area(), mountain, city, swamp);
        prop_assert!(map.mountain_count <= targets.mountains);
        prop_assert!(map.city_count <= targets.cities);
        prop_assert!(map.swamp_count <= targets.swamps);
        prop_assert!(check_invariants(&map, &players).is_empty());
    }

    /// Every contender gets exactly one king, far from all others.
    #[test]
    fn prop_kings_are_separated(
        players in 2u8..=6,
        seed in any::<u64>()
    ) {
        let params = GenerationParams { width: 30, height: 30, mountain: 0.5, city: 0.5, swamp: 0.1 };
        let mut players = roster(players);
        let mut rng = StdRng::seed_from_u64(seed);
        let Ok(map) = generate_map(&params, &mut players, &mut rng) else {
            return Ok(());
        };

        let kings: Vec<_> = players.iter().map(|p| p.king.unwrap()).collect();
        for (i, a) in kings.iter().enumerate() {
            let block = map.get(*a).unwrap();
            prop_assert_eq!(block.tile_type, TileType::King);
            prop_assert_eq!(block.owner, Some(players[i].id));
            prop_assert_eq!(block.unit, 1);
            for b in &kings[i + 1..] {
                prop_assert!(a.manhattan(*b) > KING_MIN_DISTANCE);
            }
        }
        let on_map = map.blocks().iter().filter(|b| b.tile_type == TileType::King).count();
        prop_assert_eq!(on_map, kings.len());
    }
}

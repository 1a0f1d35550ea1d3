//! Per-turn unit growth and player totals.

use serde::{Deserialize, Serialize};

use crate::game::{GameMap, Player, TileType};

/// Owned plains gain a unit on turns divisible by this.
pub const PLAIN_GROWTH_PERIOD: u32 = 50;

/// Kings and owned cities gain (and owned swamps lose) a unit on turns
/// divisible by this.
pub const FAST_GROWTH_PERIOD: u32 = 2;

/// Apply the growth rules for the current `map.turn`.
///
/// Call once per tick, after the turn counter has advanced. An owned swamp
/// that drains to zero units reverts to neutral.
pub fn update_unit(map: &mut GameMap, players: &mut [Player]) {
    let turn = map.turn;
    let plain_tick = turn % PLAIN_GROWTH_PERIOD == 0;
    let fast_tick = turn % FAST_GROWTH_PERIOD == 0;
    if !plain_tick && !fast_tick {
        return;
    }

    let mut drained = Vec::new();
    for (idx, block) in map.blocks_mut().iter_mut().enumerate() {
        let owned = block.owner.is_some();
        match block.tile_type {
            TileType::Plain if owned && plain_tick => block.unit += 1,
            TileType::King if fast_tick => block.unit += 1,
            TileType::City if owned && fast_tick => block.unit += 1,
            TileType::Swamp if owned && fast_tick => {
                block.unit = block.unit.saturating_sub(1);
                if block.unit == 0 {
                    drained.push(idx);
                }
            }
            _ => {}
        }
    }

    for idx in drained {
        let point = map.point_of(idx);
        map.set_owner(players, point, None);
    }
}

/// Army and land totals for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Units across all owned tiles.
    pub army: u64,
    /// Number of owned tiles.
    pub land: usize,
}

/// Sum a player's units and tiles, walking only their own land.
#[must_use]
pub fn get_total(map: &GameMap, player: &Player) -> Totals {
    let army = player
        .land
        .iter()
        .filter_map(|&point| map.get(point))
        .map(|block| u64::from(block.unit))
        .sum();

    Totals {
        army,
        land: player.land.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Block, ConnectionId, PlayerId, Point};

    fn setup() -> (GameMap, Vec<Player>) {
        let map = GameMap::new(4, 4).unwrap();
        let players = vec![Player::new(PlayerId::new(), ConnectionId(1), "a".into(), 0, 1)];
        (map, players)
    }

    fn place(map: &mut GameMap, players: &mut [Player], point: Point, block: Block, owned: bool) {
        map.set(point, block);
        if owned {
            let id = players[0].id;
            map.set_owner(players, point, Some(id));
        }
    }

    #[test]
    fn test_even_turn_growth() {
        let (mut map, mut players) = setup();
        place(&mut map, &mut players, Point::new(0, 0), Block { unit: 1, ..Block::new(TileType::King) }, true);
        place(&mut map, &mut players, Point::new(1, 0), Block::city(40), true);
        place(&mut map, &mut players, Point::new(2, 0), Block::city(40), false);
        place(&mut map, &mut players, Point::new(3, 0), Block { unit: 5, ..Block::plain() }, true);

        map.turn = 2;
        update_unit(&mut map, &mut players);

        assert_eq!(map.get(Point::new(0, 0)).unwrap().unit, 2);
        assert_eq!(map.get(Point::new(1, 0)).unwrap().unit, 41);
        assert_eq!(map.get(Point::new(2, 0)).unwrap().unit, 40);
        assert_eq!(map.get(Point::new(3, 0)).unwrap().unit, 5);
    }

    #[test]
    fn test_odd_turn_no_growth() {
        let (mut map, mut players) = setup();
        place(&mut map, &mut players, Point::new(0, 0), Block { unit: 1, ..Block::new(TileType::King) }, false);
        map.turn = 3;
        update_unit(&mut map, &mut players);
        assert_eq!(map.get(Point::new(0, 0)).unwrap().unit, 1);
    }

    #[test]
    fn test_unowned_king_still_grows() {
        let (mut map, mut players) = setup();
        place(&mut map, &mut players, Point::new(0, 0), Block::new(TileType::King), false);
        map.turn = 4;
        update_unit(&mut map, &mut players);
        assert_eq!(map.get(Point::new(0, 0)).unwrap().unit, 1);
    }

    #[test]
    fn test_plain_grows_every_fifty() {
        let (mut map, mut players) = setup();
        place(&mut map, &mut players, Point::new(1, 1), Block { unit: 2, ..Block::plain() }, true);
        place(&mut map, &mut players, Point::new(2, 2), Block { unit: 2, ..Block::plain() }, false);
        map.turn = 50;
        update_unit(&mut map, &mut players);
        assert_eq!(map.get(Point::new(1, 1)).unwrap().unit, 3);
        assert_eq!(map.get(Point::new(2, 2)).unwrap().unit, 2);
    }

    #[test]
    fn test_swamp_drains_to_neutral() {
        let (mut map, mut players) = setup();
        let swamp = Point::new(2, 1);
        place(&mut map, &mut players, swamp, Block { unit: 2, ..Block::new(TileType::Swamp) }, true);

        map.turn = 2;
        update_unit(&mut map, &mut players);
        assert_eq!(map.get(swamp).unwrap().unit, 1);
        assert!(players[0].land.contains(&swamp));

        map.turn = 4;
        update_unit(&mut map, &mut players);
        let block = map.get(swamp).unwrap();
        assert_eq!(block.unit, 0);
        assert_eq!(block.owner, None);
        assert_eq!(block.tile_type, TileType::Swamp);
        assert!(!players[0].land.contains(&swamp));
    }

    #[test]
    fn test_get_total_walks_land() {
        let (mut map, mut players) = setup();
        place(&mut map, &mut players, Point::new(0, 0), Block { unit: 7, ..Block::new(TileType::King) }, true);
        place(&mut map, &mut players, Point::new(0, 1), Block { unit: 3, ..Block::plain() }, true);
        place(&mut map, &mut players, Point::new(3, 3), Block::city(45), false);

        let totals = get_total(&map, &players[0]);
        assert_eq!(totals, Totals { army: 10, land: 2 });
    }
}

#![no_main]

use arbitrary::Arbitrary;
use conquer::game::combat::units_to_move;
use conquer::game::invariants::check_invariants;
use conquer::game::{AttackOrder, AttackOutcome, attack};
use conquer::{Block, ConnectionId, GameMap, Player, PlayerId, Point, TileType};
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Units on the attacking tile.
    attacker_unit: u32,
    /// Units on the defending tile.
    defender_unit: u32,
    /// Terrain of the defending tile, folded onto the passable types.
    defender_kind: u8,
    /// Who holds the defending tile: 0 nobody, 1 attacker, else defender.
    defender_owner: u8,
    /// Send half instead of all.
    half: bool,
    /// Origin coordinates (for boundary testing).
    from_x: i8,
    from_y: i8,
    /// Destination offset from the origin.
    dx: i8,
    dy: i8,
    /// Current turn.
    turn: u16,
}

fuzz_target!(|input: CombatInput| {
    let Ok(mut map) = GameMap::new(10, 10) else {
        return;
    };
    map.turn = u32::from(input.turn);

    let mut players = vec![
        Player::new(PlayerId::new(), ConnectionId(1), "attacker".into(), 0, 1),
        Player::new(PlayerId::new(), ConnectionId(2), "defender".into(), 1, 2),
    ];
    let (a, d) = (players[0].id, players[1].id);

    let from = Point::new(i32::from(input.from_x % 12), i32::from(input.from_y % 12));
    let to = from.translate(i32::from(input.dx % 3), i32::from(input.dy % 3));
    let kind = match input.defender_kind % 4 {
        0 => TileType::Plain,
        1 => TileType::City,
        2 => TileType::Swamp,
        _ => TileType::Mountain,
    };
    let attacker_unit = input.attacker_unit.min(1_000_000);
    let defender_unit = input.defender_unit.min(1_000_000);

    if map.in_bounds(from) {
        map.set_owner(&mut players, from, Some(a));
        if let Some(block) = map.get_mut(from) {
            block.unit = attacker_unit;
        }
    }
    if map.in_bounds(to) && to != from {
        map.set(to, Block { unit: defender_unit, ..Block::new(kind) });
        if kind != TileType::Mountain {
            let owner = match input.defender_owner % 3 {
                0 => None,
                1 => Some(a),
                _ => Some(d),
            };
            map.set_owner(&mut players, to, owner);
        }
    }

    assert!(check_invariants(&map, &players).is_empty());
    let before = map.blocks().to_vec();
    let turn_before = players[0].operated_turn;

    match attack(&mut map, &mut players, a, AttackOrder { from, to, half: input.half }) {
        Err(_) => {
            // Rejected orders must not touch anything.
            assert_eq!(map.blocks(), before.as_slice());
            assert_eq!(players[0].operated_turn, turn_before);
        }
        Ok(outcome) => {
            assert!(map.turn > turn_before);
            assert_eq!(players[0].operated_turn, map.turn);
            let moved = units_to_move(attacker_unit, input.half);
            let origin = map.get(from).unwrap();
            if from != to {
                assert_eq!(origin.unit, attacker_unit - moved);
                let target = map.get(to).unwrap();
                match outcome {
                    AttackOutcome::Reinforced { .. } => {
                        assert_eq!(target.unit, defender_unit + moved);
                    }
                    AttackOutcome::Repelled { .. } => {
                        assert_eq!(target.unit, defender_unit - moved);
                        assert_ne!(target.owner, Some(a));
                    }
                    AttackOutcome::Captured { .. } => {
                        assert_eq!(target.unit, moved - defender_unit);
                        assert_eq!(target.owner, Some(a));
                    }
                }
            } else {
                assert_eq!(origin.unit, attacker_unit);
            }
        }
    }

    let violations = check_invariants(&map, &players);
    assert!(violations.is_empty(), "Invariants violated after combat: {violations:?}");
});

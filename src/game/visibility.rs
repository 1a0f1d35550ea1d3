//! Fog of war.
//!
//! A player sees every tile they own plus a one-tile halo around it (the
//! 3x3 square centred on each owned tile), and anything marked
//! `always_revealed`. Elsewhere mountains and cities show as a generic
//! obstacle, swamps show their terrain without units, and all other tiles
//! are fog.

use crate::game::{Block, GameMap, Player, TileType, TileView};

/// What a viewer with no vision knows about `block`.
fn fogged(block: &Block, players: &[Player]) -> TileView {
    if block.always_revealed {
        return TileView::revealed(block, GameMap::owner_color(players, block.owner));
    }
    match block.tile_type {
        TileType::Mountain | TileType::City => TileView::OBSTACLE,
        TileType::Swamp => TileView {
            tile_type: TileType::Swamp,
            color: None,
            unit: None,
        },
        _ => TileView::FOG,
    }
}

/// The flattened, fogged grid as seen by `viewer`.
#[must_use]
pub fn view_for_player(map: &GameMap, players: &[Player], viewer: &Player) -> Vec<TileView> {
    let mut view: Vec<TileView> = map.blocks().iter().map(|b| fogged(b, players)).collect();

    for &owned in &viewer.land {
        for point in owned.square() {
            if let Some(idx) = map.index_of(point) {
                let block = &map.blocks()[idx];
                view[idx] = TileView::revealed(block, GameMap::owner_color(players, block.owner));
            }
        }
    }

    view
}

/// The flattened, unfogged grid.
#[must_use]
pub fn full_view(map: &GameMap, players: &[Player]) -> Vec<TileView> {
    map.blocks()
        .iter()
        .map(|b| TileView::revealed(b, GameMap::owner_color(players, b.owner)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ConnectionId, PlayerId, Point};

    fn single_owner() -> (GameMap, Vec<Player>) {
        let mut map = GameMap::new(5, 5).unwrap();
        let mut players = vec![
            Player::new(PlayerId::new(), ConnectionId(1), "a".into(), 3, 1),
            Player::new(PlayerId::new(), ConnectionId(2), "b".into(), 4, 2),
        ];
        let id = players[0].id;
        map.set_owner(&mut players, Point::new(2, 2), Some(id));
        map.get_mut(Point::new(2, 2)).unwrap().unit = 6;
        map.get_mut(Point::new(2, 3)).unwrap().unit = 2;
        (map, players)
    }

    fn cell(map: &GameMap, view: &[TileView], x: i32, y: i32) -> TileView {
        view[map.index_of(Point::new(x, y)).unwrap()]
    }

    #[test]
    fn test_halo_and_fog() {
        let (map, players) = single_owner();
        let view = view_for_player(&map, &players, &players[0]);

        assert_eq!(cell(&map, &view, 4, 4), TileView::FOG);
        assert_eq!(
            cell(&map, &view, 2, 3),
            TileView {
                tile_type: TileType::Plain,
                color: None,
                unit: Some(2)
            }
        );
        assert_eq!(cell(&map, &view, 2, 2).color, Some(3));
        assert_eq!(cell(&map, &view, 2, 2).unit, Some(6));
        assert_eq!(cell(&map, &view, 1, 1).unit, Some(0));
        assert_eq!(cell(&map, &view, 0, 0), TileView::FOG);
    }

    #[test]
    fn test_obstacle_silhouettes() {
        let (mut map, players) = single_owner();
        map.set(Point::new(0, 0), Block::new(TileType::Mountain));
        map.set(Point::new(4, 0), Block::city(44));
        map.set(Point::new(0, 4), Block { unit: 3, ..Block::new(TileType::Swamp) });
        map.set(Point::new(3, 3), Block::city(50));

        let view = view_for_player(&map, &players, &players[0]);

        assert_eq!(cell(&map, &view, 0, 0), TileView::OBSTACLE);
        assert_eq!(cell(&map, &view, 4, 0), TileView::OBSTACLE);
        assert_eq!(
            cell(&map, &view, 0, 4),
            TileView {
                tile_type: TileType::Swamp,
                color: None,
                unit: None
            }
        );
        // Within the halo the city is shown as it is.
        assert_eq!(cell(&map, &view, 3, 3).tile_type, TileType::City);
        assert_eq!(cell(&map, &view, 3, 3).unit, Some(50));
    }

    #[test]
    fn test_always_revealed_passes_through() {
        let (mut map, mut players) = single_owner();
        let far = Point::new(0, 4);
        map.set(
            far,
            Block {
                unit: 9,
                always_revealed: true,
                ..Block::new(TileType::King)
            },
        );
        let other = players[1].id;
        map.set_owner(&mut players, far, Some(other));

        let view = view_for_player(&map, &players, &players[0]);
        assert_eq!(
            cell(&map, &view, 0, 4),
            TileView {
                tile_type: TileType::King,
                color: Some(4),
                unit: Some(9)
            }
        );
    }

    #[test]
    fn test_edge_halo_is_clipped() {
        let mut map = GameMap::new(3, 3).unwrap();
        let mut players = vec![Player::new(PlayerId::new(), ConnectionId(1), "a".into(), 0, 1)];
        let id = players[0].id;
        map.set_owner(&mut players, Point::new(0, 0), Some(id));

        let view = view_for_player(&map, &players, &players[0]);
        let visible = view.iter().filter(|v| v.tile_type != TileType::Fog).count();
        assert_eq!(visible, 4);
    }

    #[test]
    fn test_full_view_reveals_everything() {
        let (mut map, players) = single_owner();
        map.set(Point::new(0, 0), Block::new(TileType::Mountain));
        let view = full_view(&map, &players);
        assert!(view.iter().all(|v| v.unit.is_some()));
        assert_eq!(cell(&map, &view, 0, 0).tile_type, TileType::Mountain);
        assert_eq!(cell(&map, &view, 2, 2).color, Some(3));
    }
}

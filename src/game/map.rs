//! The authoritative block grid.

use crate::error::GenerationError;
use crate::game::{Block, Player, PlayerId, Point, player};

/// The game map.
///
/// Blocks are stored in row-major order and addressed by [`Point`]; players
/// refer to blocks by point, never by reference.
#[derive(Debug, Clone)]
pub struct GameMap {
    /// Identifier of this map instance.
    pub id: String,
    /// Display name (`"random"` for generated maps).
    pub name: String,
    /// Width of the map in tiles.
    width: u16,
    /// Height of the map in tiles.
    height: u16,
    /// Mountains actually placed.
    pub mountain_count: u32,
    /// Cities actually placed.
    pub city_count: u32,
    /// Swamps actually placed.
    pub swamp_count: u32,
    /// Blocks stored in row-major order.
    blocks: Vec<Block>,
    /// Current turn, starting at 0.
    pub turn: u32,
}

impl GameMap {
    /// Create a new map filled with plain tiles.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDimensions`] if either side is zero.
    pub fn new(width: u16, height: u16) -> Result<Self, GenerationError> {
        if width == 0 || height == 0 {
            return Err(GenerationError::InvalidDimensions { width, height });
        }

        let size = usize::from(width) * usize::from(height);
        Ok(Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: "random".to_string(),
            width,
            height,
            mountain_count: 0,
            city_count: 0,
            swamp_count: 0,
            blocks: vec![Block::plain(); size],
            turn: 0,
        })
    }

    /// Get the width of the map.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the map.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of cells.
    #[must_use]
    pub fn area(&self) -> usize {
        self.blocks.len()
    }

    /// Raw blocks in row-major order.
    #[must_use]
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Raw blocks in row-major order, mutably.
    #[must_use]
    #[inline]
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Check if a point is within the map bounds.
    #[must_use]
    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.x < i32::from(self.width)
            && point.y < i32::from(self.height)
    }

    /// Convert a point to an index into the block array.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn index_of(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some(point.y as usize * usize::from(self.width) + point.x as usize)
        } else {
            None
        }
    }

    /// Convert a block index back to its point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn point_of(&self, index: usize) -> Point {
        let width = usize::from(self.width);
        Point::new((index % width) as i32, (index / width) as i32)
    }

    /// Get a reference to the block at the given point.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<&Block> {
        self.index_of(point).map(|idx| &self.blocks[idx])
    }

    /// Get a mutable reference to the block at the given point.
    #[must_use]
    pub fn get_mut(&mut self, point: Point) -> Option<&mut Block> {
        self.index_of(point).map(|idx| &mut self.blocks[idx])
    }

    /// Replace the block at the given point.
    ///
    /// Returns `false` if the point is out of bounds. Ownership is copied
    /// verbatim; use [`GameMap::set_owner`] to keep player land in sync.
    pub fn set(&mut self, point: Point, block: Block) -> bool {
        if let Some(idx) = self.index_of(point) {
            self.blocks[idx] = block;
            true
        } else {
            false
        }
    }

    /// Iterate over all points and blocks.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| (self.point_of(idx), block))
    }

    /// Change the owner of one block, updating both players' land.
    ///
    /// Returns the previous owner.
    pub fn set_owner(
        &mut self,
        players: &mut [Player],
        point: Point,
        owner: Option<PlayerId>,
    ) -> Option<PlayerId> {
        let block = self.get_mut(point)?;
        let previous = block.owner;
        block.owner = owner;

        if previous == owner {
            return previous;
        }
        if let Some(old) = previous.and_then(|id| player::find_mut(players, id)) {
            old.land.remove(&point);
        }
        if let Some(new) = owner.and_then(|id| player::find_mut(players, id)) {
            new.land.insert(point);
        }
        previous
    }

    /// Color index of the owner of a block, if it has one.
    #[must_use]
    pub fn owner_color(players: &[Player], owner: Option<PlayerId>) -> Option<u8> {
        owner
            .and_then(|id| player::find(players, id))
            .map(|p| p.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ConnectionId, TileType};

    #[test]
    fn test_map_creation() {
        let map = GameMap::new(10, 8).unwrap();
        assert_eq!(map.width(), 10);
        assert_eq!(map.height(), 8);
        assert_eq!(map.area(), 80);
        assert_eq!(map.turn, 0);
    }

    #[test]
    fn test_map_zero_size() {
        assert!(GameMap::new(0, 10).is_err());
        assert!(GameMap::new(10, 0).is_err());
    }

    #[test]
    fn test_map_bounds() {
        let map = GameMap::new(10, 10).unwrap();
        assert!(map.in_bounds(Point::new(0, 0)));
        assert!(map.in_bounds(Point::new(9, 9)));
        assert!(!map.in_bounds(Point::new(10, 0)));
        assert!(!map.in_bounds(Point::new(0, -1)));
    }

    #[test]
    fn test_index_round_trip() {
        let map = GameMap::new(7, 5).unwrap();
        for idx in 0..map.area() {
            assert_eq!(map.index_of(map.point_of(idx)), Some(idx));
        }
    }

    #[test]
    fn test_map_get_set() {
        let mut map = GameMap::new(10, 10).unwrap();
        let point = Point::new(5, 5);
        assert_eq!(map.get(point).unwrap().tile_type, TileType::Plain);

        map.set(point, Block::city(40));
        let block = map.get(point).unwrap();
        assert_eq!(block.tile_type, TileType::City);
        assert_eq!(block.unit, 40);
    }

    #[test]
    fn test_set_owner_moves_land() {
        let mut map = GameMap::new(4, 4).unwrap();
        let mut players = vec![
            Player::new(PlayerId::new(), ConnectionId(1), "a".into(), 0, 1),
            Player::new(PlayerId::new(), ConnectionId(2), "b".into(), 1, 2),
        ];
        let (a, b) = (players[0].id, players[1].id);
        let point = Point::new(1, 2);

        assert_eq!(map.set_owner(&mut players, point, Some(a)), None);
        assert!(players[0].land.contains(&point));

        assert_eq!(map.set_owner(&mut players, point, Some(b)), Some(a));
        assert!(!players[0].land.contains(&point));
        assert!(players[1].land.contains(&point));
        assert_eq!(map.get(point).unwrap().owner, Some(b));

        map.set_owner(&mut players, point, None);
        assert!(players[1].land.is_empty());
    }
}

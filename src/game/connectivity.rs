//! Connectivity of open terrain.
//!
//! Uses a weighted union-find (union by size, path compression) over the
//! non-obstacle cells. One row-major pass unions each open cell with its
//! open up and left neighbours, so a check is O(A) with near-constant
//! amortized cost per union/find.

use crate::game::GameMap;

/// Disjoint-set forest over cell indices.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    /// Create `n` singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Representative of the set containing `x`.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`, returning the new root.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return ra;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        ra
    }

    /// Size of the set containing `x`.
    pub fn set_size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

/// Size of the largest 4-connected component of non-obstacle cells.
#[must_use]
pub fn largest_open_component(map: &GameMap) -> usize {
    let width = usize::from(map.width());
    let blocks = map.blocks();
    let mut sets = DisjointSet::new(blocks.len());
    let mut largest = 0;

    for (idx, block) in blocks.iter().enumerate() {
        if block.tile_type.is_obstacle() {
            continue;
        }
        let mut root = sets.find(idx);
        if idx >= width && !blocks[idx - width].tile_type.is_obstacle() {
            root = sets.union(idx, idx - width);
        }
        if idx % width != 0 && !blocks[idx - 1].tile_type.is_obstacle() {
            root = sets.union(root, idx - 1);
        }
        largest = largest.max(sets.set_size(root));
    }

    largest
}

/// Whether every non-obstacle cell belongs to one connected component.
///
/// `obstacle_count` is the number of obstacles placed so far.
#[must_use]
pub fn is_connected(map: &GameMap, obstacle_count: usize) -> bool {
    largest_open_component(map) >= map.area().saturating_sub(obstacle_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Block, Point, TileType};

    #[test]
    fn test_union_find_sizes() {
        let mut sets = DisjointSet::new(6);
        sets.union(0, 1);
        sets.union(2, 3);
        sets.union(1, 3);
        assert_eq!(sets.set_size(0), 4);
        assert_eq!(sets.find(0), sets.find(2));
        assert_ne!(sets.find(0), sets.find(5));
        assert_eq!(sets.set_size(5), 1);
    }

    #[test]
    fn test_open_map_is_connected() {
        let map = GameMap::new(6, 4).unwrap();
        assert_eq!(largest_open_component(&map), 24);
        assert!(is_connected(&map, 0));
    }

    #[test]
    fn test_wall_splits_map() {
        let mut map = GameMap::new(5, 5).unwrap();
        for y in 0..5 {
            map.set(Point::new(2, y), Block::new(TileType::Mountain));
        }
        assert_eq!(largest_open_component(&map), 10);
        assert!(!is_connected(&map, 5));
    }

    #[test]
    fn test_cities_block_connectivity() {
        let mut map = GameMap::new(3, 3).unwrap();
        map.set(Point::new(1, 0), Block::city(40));
        map.set(Point::new(0, 1), Block::new(TileType::Mountain));
        // (0, 0) is sealed off.
        assert!(!is_connected(&map, 2));
    }

    #[test]
    fn test_snake_shape_stays_connected() {
        // Open path that winds back on itself: requires unions across rows.
        let mut map = GameMap::new(5, 3).unwrap();
        for x in 0..4 {
            map.set(Point::new(x, 1), Block::new(TileType::Mountain));
        }
        assert!(is_connected(&map, 4));
    }
}

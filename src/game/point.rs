//! Grid coordinates.

use serde::{Deserialize, Serialize};

/// A coordinate on the map.
///
/// Signed so that translated points may fall outside the grid; bounds are
/// checked by [`GameMap::in_bounds`](crate::game::GameMap::in_bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by `(dx, dy)`.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan (taxicab) distance to another point.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours (up, down, left, right), unchecked.
    #[must_use]
    pub const fn orthogonal(self) -> [Self; 4] {
        [
            self.translate(0, -1),
            self.translate(0, 1),
            self.translate(-1, 0),
            self.translate(1, 0),
        ]
    }

    /// The 3x3 block centred on this point, itself included, unchecked.
    pub fn square(self) -> impl Iterator<Item = Self> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.translate(dx, dy)))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        let p = Point::new(3, 4).translate(-1, 2);
        assert_eq!(p, Point::new(2, 6));
    }

    #[test]
    fn test_distances() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
    }

    #[test]
    fn test_square_covers_nine_cells() {
        let cells: Vec<_> = Point::new(2, 2).square().collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&Point::new(1, 1)));
        assert!(cells.contains(&Point::new(3, 3)));
        assert!(cells.contains(&Point::new(2, 2)));
    }

    #[test]
    fn test_orthogonal() {
        let adj = Point::new(5, 5).orthogonal();
        assert!(adj.contains(&Point::new(5, 4)));
        assert!(adj.contains(&Point::new(5, 6)));
        assert!(adj.contains(&Point::new(4, 5)));
        assert!(adj.contains(&Point::new(6, 5)));
    }
}

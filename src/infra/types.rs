use serde::{Deserialize, Serialize};

/// Grid cell coordinate. Travels over the wire as a `[x, y]` pair.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.x, self.y - 1), // North
            Position::new(self.x + 1, self.y), // East
            Position::new(self.x, self.y + 1), // South
            Position::new(self.x - 1, self.y), // West
        ]
    }

    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.distance(other) == 1
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// True when both cells share a row or a column.
    pub fn is_aligned(&self, other: &Position) -> bool {
        self.x == other.x || self.y == other.y
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Position::new(x, y)
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> Self {
        [pos.x, pos.y]
    }
}

/// The four axis directions a blast travels along, in neighbour order.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Bounds of a `width` x `height` map anchored at the origin.
    /// Empty (contains nothing) when either dimension is not positive.
    pub fn of_map(width: i32, height: i32) -> Self {
        Self::new(0, width - 1, 0, height - 1)
    }

    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }

    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.min_x, self.max_x.max(self.min_x)),
            pos.y.clamp(self.min_y, self.max_y.max(self.min_y)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wire_form() {
        let pos: Position = serde_json::from_str("[3, 7]").unwrap();
        assert_eq!(pos, Position::new(3, 7));
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[3,7]");
    }

    #[test]
    fn test_bounds_of_degenerate_map_is_empty() {
        let bounds = Bounds::of_map(0, 5);
        assert!(!bounds.contains(&Position::new(0, 0)));
        assert!(Bounds::of_map(5, 5).contains(&Position::new(4, 4)));
    }
}

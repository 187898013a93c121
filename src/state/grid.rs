use std::collections::HashSet;

use tracing::debug;

use crate::infra::{Bounds, Position};
use crate::state::{DangerMap, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Wall,
    DestructibleBox,
    Bomb,
    Danger,
    Ally,
    Enemy,
}

impl Cell {
    /// Higher wins when several classifications apply to one cell.
    fn precedence(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Ally | Cell::Enemy => 1,
            Cell::DestructibleBox => 2,
            Cell::Danger => 3,
            Cell::Bomb => 4,
            Cell::Wall => 5,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Wall => '#',
            Cell::DestructibleBox => 'B',
            Cell::Bomb => '*',
            Cell::Danger => '!',
            Cell::Ally => 'A',
            Cell::Enemy => 'E',
        }
    }
}

/// Per-tick classification of every arena cell.
///
/// Boxes, bombs and hostiles are also kept as sets because a higher
/// classification (danger over a box, for example) hides them in `cells`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
    boxes: HashSet<Position>,
    bombs: HashSet<Position>,
    hostiles: HashSet<Position>,
}

impl Grid {
    /// All-empty grid. Non-positive dimensions, or an area too large to
    /// index with `i32`, give a grid with no cells.
    pub fn new(width: i32, height: i32) -> Self {
        let area = (width > 0 && height > 0)
            .then(|| width.checked_mul(height))
            .flatten()
            .and_then(|area| usize::try_from(area).ok());
        let (width, height, area) = match area {
            Some(area) => (width, height, area),
            None => (0, 0, 0),
        };
        Self {
            width,
            height,
            cells: vec![Cell::Empty; area],
            boxes: HashSet::new(),
            bombs: HashSet::new(),
            hostiles: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_map(self.width, self.height)
    }

    pub fn in_bounds(&self, pos: &Position) -> bool {
        self.bounds().contains(pos)
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn get(&self, pos: &Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Apply `cell` unless the current classification outranks it.
    /// Returns whether the cell changed.
    pub fn stamp(&mut self, pos: &Position, cell: Cell) -> bool {
        let Some(index) = self.index(pos) else {
            return false;
        };
        if self.cells[index].precedence() > cell.precedence() {
            return false;
        }
        self.cells[index] = cell;
        true
    }

    pub fn is_wall(&self, pos: &Position) -> bool {
        self.get(pos) == Some(Cell::Wall)
    }

    pub fn is_box(&self, pos: &Position) -> bool {
        self.boxes.contains(pos)
    }

    pub fn is_bomb(&self, pos: &Position) -> bool {
        self.bombs.contains(pos)
    }

    pub fn is_hostile(&self, pos: &Position) -> bool {
        self.hostiles.contains(pos)
    }

    pub fn is_danger(&self, pos: &Position) -> bool {
        self.get(pos) == Some(Cell::Danger)
    }

    /// Cells a unit cannot step on: off-map, walls, boxes, bombs and hostiles.
    pub fn is_blocked(&self, pos: &Position) -> bool {
        !self.in_bounds(pos)
            || self.is_wall(pos)
            || self.is_box(pos)
            || self.is_bomb(pos)
            || self.is_hostile(pos)
    }

    pub fn boxes(&self) -> impl Iterator<Item = &Position> {
        self.boxes.iter()
    }

    pub fn draw_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|c| c.to_char()));
            out.push('\n');
        }
        out
    }
}

/// The classified arena for one tick: obstacle grid plus blast timing.
#[derive(Debug, Clone)]
pub struct ArenaView {
    pub grid: Grid,
    pub danger: DangerMap,
}

impl ArenaView {
    /// Build a fresh classification from `snapshot`. Cells whose blast is due
    /// within `critical_fuse` seconds are marked [`Cell::Danger`].
    #[tracing::instrument(level = "debug", skip(snapshot), fields(round = %snapshot.round))]
    pub fn classify(snapshot: &Snapshot, critical_fuse: f64) -> Self {
        let mut grid = Grid::new(snapshot.width(), snapshot.height());
        if grid.is_empty() {
            debug!(
                "Malformed map size {}x{}, nothing to classify",
                snapshot.width(),
                snapshot.height()
            );
            return Self {
                grid,
                danger: DangerMap::default(),
            };
        }

        for wall in &snapshot.arena.walls {
            grid.stamp(wall, Cell::Wall);
        }
        for pos in &snapshot.arena.boxes {
            if grid.stamp(pos, Cell::DestructibleBox) {
                grid.boxes.insert(*pos);
            }
        }
        for bomb in &snapshot.arena.bombs {
            grid.stamp(&bomb.pos, Cell::Bomb);
            if grid.in_bounds(&bomb.pos) {
                grid.bombs.insert(bomb.pos);
            }
        }

        let danger = DangerMap::propagate(&grid, &snapshot.arena.bombs);
        for (pos, fuse) in danger.cells() {
            if *fuse <= critical_fuse {
                grid.stamp(pos, Cell::Danger);
            }
        }

        for unit in snapshot.living_units() {
            grid.stamp(&unit.pos, Cell::Ally);
        }
        for pos in snapshot.hostile_positions() {
            grid.stamp(&pos, Cell::Enemy);
            if grid.in_bounds(&pos) {
                grid.hostiles.insert(pos);
            }
        }

        Self { grid, danger }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::SnapshotBuilder;

    #[test]
    fn test_wall_outranks_danger_and_bomb() {
        // A bomb reported on a wall cell must not turn the wall into anything else.
        let snapshot = SnapshotBuilder::new(3, 3).wall(1, 1).bomb(1, 1, 0.5, 1).build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert_eq!(view.grid.get(&Position::new(1, 1)), Some(Cell::Wall));
        assert_eq!(view.grid.get(&Position::new(1, 0)), Some(Cell::Danger));
    }

    #[test]
    fn test_box_in_blast_becomes_danger_and_stops_blast() {
        let snapshot = SnapshotBuilder::new(5, 1).box_at(2, 0).bomb(0, 0, 1.0, 4).build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert_eq!(view.grid.get(&Position::new(2, 0)), Some(Cell::Danger));
        assert_eq!(view.grid.get(&Position::new(3, 0)), Some(Cell::Empty));
        // Still a box for movement purposes.
        assert!(view.grid.is_blocked(&Position::new(2, 0)));
    }

    #[test]
    fn test_distant_fuse_is_not_flagged_danger() {
        let snapshot = SnapshotBuilder::new(5, 1).bomb(0, 0, 6.0, 4).build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert_eq!(view.grid.get(&Position::new(2, 0)), Some(Cell::Empty));
        assert!(view.danger.threatens(&Position::new(2, 0)));
    }

    #[test]
    fn test_units_do_not_hide_danger() {
        let snapshot = SnapshotBuilder::new(5, 1)
            .bomb(0, 0, 1.0, 4)
            .unit("a", 2, 0, 1)
            .enemy("e", 4, 0)
            .build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert_eq!(view.grid.get(&Position::new(2, 0)), Some(Cell::Danger));
        assert_eq!(view.grid.get(&Position::new(4, 0)), Some(Cell::Danger));
        assert!(view.grid.is_hostile(&Position::new(4, 0)));
    }

    #[test]
    fn test_malformed_dimensions_give_empty_grid() {
        let snapshot = SnapshotBuilder::new(0, 7).bomb(0, 0, 1.0, 1).build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert!(view.is_empty());
        assert!(view.danger.zones().is_empty());
    }

    #[test]
    fn test_oversized_dimensions_give_empty_grid() {
        let grid = Grid::new(50_000, 50_000);
        assert!(grid.is_empty());
        assert_eq!((grid.width, grid.height), (0, 0));
        assert!(!grid.in_bounds(&Position::new(0, 0)));
    }

    #[test]
    fn test_ascii_rendering() {
        let snapshot = SnapshotBuilder::new(3, 1).wall(0, 0).box_at(2, 0).build();
        let view = ArenaView::classify(&snapshot, 1.5);
        assert_eq!(view.grid.draw_ascii(), "#.B\n");
    }
}

use std::collections::{HashMap, VecDeque};

use crate::infra::{Bounds, Position};

/// Result of a bounded flood fill: every reached cell with its step count,
/// in breadth-first order, and the back-links needed to rebuild paths.
#[derive(Debug, Clone)]
pub struct Reachability {
    start: Position,
    came_from: HashMap<Position, Position>,
    order: Vec<(Position, usize)>,
}

impl Reachability {
    /// Cells in the order they were reached, paired with their step count.
    pub fn cells(&self) -> &[(Position, usize)] {
        &self.order
    }

    pub fn contains(&self, pos: &Position) -> bool {
        *pos == self.start || self.came_from.contains_key(pos)
    }

    /// Path from the flood origin to `goal`, both ends included.
    pub fn path_to(&self, goal: Position) -> Option<Vec<Position>> {
        if !self.contains(&goal) {
            return None;
        }
        Some(reconstruct_path(&self.came_from, goal))
    }
}

pub struct Bfs;

impl Bfs {
    /// Breadth-first search for the closest cell satisfying `is_target`.
    ///
    /// `can_enter(pos, steps)` decides whether `pos` may be stepped on as the
    /// `steps`-th move; the start cell is always accepted. Paths longer than
    /// `max_len` moves are never produced. The returned path starts with
    /// `start`.
    pub fn find_path<F, T>(
        bounds: Bounds,
        start: Position,
        max_len: usize,
        can_enter: F,
        is_target: T,
    ) -> Option<Vec<Position>>
    where
        F: Fn(&Position, usize) -> bool,
        T: Fn(&Position, usize) -> bool,
    {
        if is_target(&start, 0) {
            return Some(vec![start]);
        }

        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut came_from: HashMap<Position, Position> = HashMap::new();

        while let Some((current, steps)) = queue.pop_front() {
            if steps >= max_len {
                continue;
            }
            let next_steps = steps + 1;

            for neighbor in current.neighbors() {
                if neighbor == start || came_from.contains_key(&neighbor) {
                    continue;
                }
                if !bounds.contains(&neighbor) || !can_enter(&neighbor, next_steps) {
                    continue;
                }
                came_from.insert(neighbor, current);

                if is_target(&neighbor, next_steps) {
                    return Some(reconstruct_path(&came_from, neighbor));
                }
                queue.push_back((neighbor, next_steps));
            }
        }

        None
    }

    /// Flood every cell reachable within `max_len` moves.
    pub fn flood<F>(bounds: Bounds, start: Position, max_len: usize, can_enter: F) -> Reachability
    where
        F: Fn(&Position, usize) -> bool,
    {
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut order = vec![(start, 0usize)];

        while let Some((current, steps)) = queue.pop_front() {
            if steps >= max_len {
                continue;
            }
            let next_steps = steps + 1;

            for neighbor in current.neighbors() {
                if neighbor == start || came_from.contains_key(&neighbor) {
                    continue;
                }
                if !bounds.contains(&neighbor) || !can_enter(&neighbor, next_steps) {
                    continue;
                }
                came_from.insert(neighbor, current);
                order.push((neighbor, next_steps));
                queue.push_back((neighbor, next_steps));
            }
        }

        Reachability {
            start,
            came_from,
            order,
        }
    }
}

fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    mut current: Position,
) -> Vec<Position> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_path_around_wall() {
        let bounds = Bounds::of_map(3, 3);
        let wall = Position::new(1, 1);
        let path = Bfs::find_path(
            bounds,
            Position::new(0, 1),
            10,
            |pos, _| *pos != wall,
            |pos, _| *pos == Position::new(2, 1),
        )
        .unwrap();

        assert_eq!(path.first(), Some(&Position::new(0, 1)));
        assert_eq!(path.last(), Some(&Position::new(2, 1)));
        assert_eq!(path.len(), 5);
        assert!(!path.contains(&wall));
    }

    #[test]
    fn test_find_path_respects_max_len() {
        let bounds = Bounds::of_map(10, 1);
        let target = Position::new(9, 0);
        let found = Bfs::find_path(bounds, Position::new(0, 0), 5, |_, _| true, |pos, _| {
            *pos == target
        });
        assert!(found.is_none());
    }

    #[test]
    fn test_start_satisfying_target_returns_single_cell() {
        let bounds = Bounds::of_map(2, 2);
        let start = Position::new(1, 1);
        let path = Bfs::find_path(bounds, start, 3, |_, _| true, |_, _| true).unwrap();
        assert_eq!(path, vec![start]);
    }

    #[test]
    fn test_flood_reports_step_counts() {
        let bounds = Bounds::of_map(5, 5);
        let reach = Bfs::flood(bounds, Position::new(2, 2), 2, |_, _| true);

        assert!(reach.cells().iter().all(|(pos, steps)| {
            pos.distance(&Position::new(2, 2)) as usize == *steps && *steps <= 2
        }));
        // Diamond of radius two: 1 + 4 + 8 cells.
        assert_eq!(reach.cells().len(), 13);

        let path = reach.path_to(Position::new(4, 2)).unwrap();
        assert_eq!(path.len(), 3);
        assert!(reach.path_to(Position::new(0, 0)).is_none());
    }
}

use std::collections::HashMap;

use tracing::trace;

use crate::infra::{DIRECTIONS, Position};
use crate::state::{Bomb, Grid};

/// Cells a blast centred on `origin` would engulf, origin included.
///
/// Along each axis the blast stops before a true wall or the map edge. A
/// destructible box or another bomb is engulfed but ends the line.
pub fn blast_lane(grid: &Grid, origin: Position, radius: i32) -> Vec<Position> {
    let mut lane = vec![origin];
    for (dx, dy) in DIRECTIONS {
        for step in 1..=radius.max(0) {
            let pos = origin.offset(dx * step, dy * step);
            if !grid.in_bounds(&pos) || grid.is_wall(&pos) {
                break;
            }
            lane.push(pos);
            if grid.is_box(&pos) || grid.is_bomb(&pos) {
                break;
            }
        }
    }
    lane
}

/// One bomb's blast after chain resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastZone {
    pub origin: Position,
    pub radius: i32,
    /// Own fuse, or earlier when another blast sets this bomb off first.
    pub effective_fuse: f64,
    pub cells: Vec<Position>,
}

#[derive(Debug, Clone, Default)]
pub struct DangerMap {
    zones: Vec<BlastZone>,
    fuse: HashMap<Position, f64>,
}

impl DangerMap {
    /// Compute every bomb's blast, resolve chain reactions and record, per
    /// cell, the earliest time it will be engulfed.
    #[tracing::instrument(level = "trace", skip(grid, bombs), fields(bombs = bombs.len()))]
    pub fn propagate(grid: &Grid, bombs: &[Bomb]) -> Self {
        if grid.is_empty() || bombs.is_empty() {
            return Self::default();
        }

        let lanes: Vec<Vec<Position>> = bombs
            .iter()
            .map(|bomb| blast_lane(grid, bomb.pos, bomb.radius))
            .collect();

        let mut bombs_at: HashMap<Position, Vec<usize>> = HashMap::new();
        for (index, bomb) in bombs.iter().enumerate() {
            bombs_at.entry(bomb.pos).or_default().push(index);
        }

        // triggers[i]: bombs set off when bomb i detonates
        let triggers: Vec<Vec<usize>> = lanes
            .iter()
            .enumerate()
            .map(|(index, lane)| {
                lane.iter()
                    .filter_map(|pos| bombs_at.get(pos))
                    .flatten()
                    .copied()
                    .filter(|&other| other != index)
                    .collect()
            })
            .collect();

        let mut effective: Vec<f64> = bombs.iter().map(|b| b.fuse).collect();

        // A chain of n bombs settles after at most n passes.
        let max_passes = bombs.len();
        for pass in 0..max_passes {
            let mut changed = false;
            for (index, targets) in triggers.iter().enumerate() {
                let fuse = effective[index];
                for &target in targets {
                    if fuse < effective[target] {
                        effective[target] = fuse;
                        changed = true;
                    }
                }
            }
            if !changed {
                trace!("Chain relaxation settled after {} passes", pass + 1);
                break;
            }
        }

        let mut fuse: HashMap<Position, f64> = HashMap::new();
        let zones: Vec<BlastZone> = bombs
            .iter()
            .zip(lanes)
            .zip(effective)
            .map(|((bomb, cells), effective_fuse)| {
                for pos in &cells {
                    fuse.entry(*pos)
                        .and_modify(|f| *f = f.min(effective_fuse))
                        .or_insert(effective_fuse);
                }
                BlastZone {
                    origin: bomb.pos,
                    radius: bomb.radius,
                    effective_fuse,
                    cells,
                }
            })
            .collect();

        Self { zones, fuse }
    }

    /// Earliest time the cell is engulfed, if any blast reaches it.
    pub fn fuse_at(&self, pos: &Position) -> Option<f64> {
        self.fuse.get(pos).copied()
    }

    /// Whether any blast will eventually reach the cell.
    pub fn threatens(&self, pos: &Position) -> bool {
        self.fuse.contains_key(pos)
    }

    pub fn zones(&self) -> &[BlastZone] {
        &self.zones
    }

    pub fn zone_at(&self, origin: &Position) -> Option<&BlastZone> {
        self.zones.iter().find(|zone| zone.origin == *origin)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&Position, &f64)> {
        self.fuse.iter()
    }

    /// Whether a unit occupying `pos` from `enter` to `leave` seconds from now
    /// is caught by a blast, allowing `margin` seconds either side.
    pub fn is_unsafe_during(&self, pos: &Position, enter: f64, leave: f64, margin: f64) -> bool {
        self.fuse_at(pos)
            .is_some_and(|fuse| fuse + margin >= enter && fuse - margin <= leave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::SnapshotBuilder;
    use crate::state::ArenaView;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn view(snapshot: &crate::state::Snapshot) -> ArenaView {
        ArenaView::classify(snapshot, 1.5)
    }

    #[test]
    fn test_blast_stops_before_wall_and_on_box() {
        let snapshot = SnapshotBuilder::new(7, 1)
            .wall(1, 0)
            .box_at(5, 0)
            .bomb(3, 0, 1.0, 3)
            .build();
        let view = view(&snapshot);
        let lane = blast_lane(&view.grid, Position::new(3, 0), 3);

        assert!(lane.contains(&Position::new(2, 0)));
        assert!(!lane.contains(&Position::new(1, 0)));
        assert!(!lane.contains(&Position::new(0, 0)));
        assert!(lane.contains(&Position::new(5, 0)));
        assert!(!lane.contains(&Position::new(6, 0)));
    }

    #[test]
    fn test_chain_reaction_shortens_fuse() {
        let snapshot = SnapshotBuilder::new(9, 1)
            .bomb(1, 0, 5.0, 3)
            .bomb(3, 0, 1.0, 1)
            .build();
        let view = view(&snapshot);
        let slow = view.danger.zone_at(&Position::new(1, 0)).unwrap();
        assert!(slow.effective_fuse <= 1.0);
        assert!(view.danger.fuse_at(&Position::new(0, 0)).unwrap() <= 1.0);
    }

    #[test]
    fn test_long_chain_fully_resolves() {
        // Each bomb only reaches its right-hand neighbour; the last one is fastest.
        let mut builder = SnapshotBuilder::new(20, 1);
        for i in 0..8 {
            let fuse = if i == 7 { 0.5 } else { 9.0 };
            builder = builder.bomb(i * 2, 0, fuse, 2);
        }
        // Bombs reach both ways, so the fast one propagates all the way back.
        let view = view(&builder.build());
        assert!(view.danger.zones().iter().all(|z| z.effective_fuse <= 0.5));
    }

    #[test]
    fn test_chain_blocked_by_wall() {
        let snapshot = SnapshotBuilder::new(9, 1)
            .bomb(1, 0, 5.0, 3)
            .wall(2, 0)
            .bomb(3, 0, 1.0, 1)
            .build();
        let view = view(&snapshot);
        let slow = view.danger.zone_at(&Position::new(1, 0)).unwrap();
        assert_eq!(slow.effective_fuse, 5.0);
    }

    #[test]
    fn test_is_unsafe_during_window() {
        let snapshot = SnapshotBuilder::new(5, 1).bomb(0, 0, 2.0, 4).build();
        let view = view(&snapshot);
        let cell = Position::new(3, 0);
        assert!(!view.danger.is_unsafe_during(&cell, 0.0, 1.0, 0.3));
        assert!(view.danger.is_unsafe_during(&cell, 1.5, 2.5, 0.3));
        assert!(!view.danger.is_unsafe_during(&cell, 3.0, 4.0, 0.3));
    }

    #[test]
    fn test_blast_never_exceeds_radius_or_crosses_walls() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut builder = SnapshotBuilder::new(15, 15);
            let mut walls = Vec::new();
            for _ in 0..30 {
                let (x, y) = (rng.random_range(0..15), rng.random_range(0..15));
                walls.push(Position::new(x, y));
                builder = builder.wall(x, y);
            }
            let mut bombs = Vec::new();
            for _ in 0..4 {
                let bomb = Bomb::new(
                    Position::new(rng.random_range(0..15), rng.random_range(0..15)),
                    rng.random_range(0.0..3.0),
                    rng.random_range(1..5),
                );
                bombs.push(bomb);
                builder = builder.bomb(bomb.pos.x, bomb.pos.y, bomb.fuse, bomb.radius);
            }
            let view = view(&builder.build());

            for (pos, _) in view.danger.cells() {
                let reached_by_some_bomb = bombs.iter().any(|bomb| {
                    if !bomb.pos.is_aligned(pos) || bomb.pos.distance(pos) > bomb.radius {
                        return false;
                    }
                    // Every cell strictly between the bomb and pos must be free of walls.
                    let (dx, dy) = ((pos.x - bomb.pos.x).signum(), (pos.y - bomb.pos.y).signum());
                    (1..=bomb.pos.distance(pos))
                        .map(|step| bomb.pos.offset(dx * step, dy * step))
                        .all(|cell| !walls.contains(&cell))
                });
                assert!(reached_by_some_bomb, "{:?} flagged without a clear blast line", pos);
            }
        }
    }
}

//! Bounded breadth-first searches used to move a unit around.
//!
//! Every path returned here starts with the cell the search started from;
//! commands drop that first cell before sending.

use std::collections::HashSet;

use tracing::debug;

use crate::infra::{Bfs, Position};
use crate::planners::UnitContext;
use crate::state::blast_lane;

/// Shortest path from the unit to the first cell satisfying `is_target`,
/// moving only where [`UnitContext::can_step`] allows.
pub fn find_path<T>(ctx: &UnitContext, is_target: T) -> Option<Vec<Position>>
where
    T: Fn(&Position) -> bool,
{
    Bfs::find_path(
        ctx.view.grid.bounds(),
        ctx.position(),
        ctx.config.max_path_len,
        |pos, steps| ctx.can_step(pos, steps),
        |pos, _| is_target(pos),
    )
}

pub fn path_to(ctx: &UnitContext, goal: Position) -> Option<Vec<Position>> {
    find_path(ctx, |pos| *pos == goal)
}

/// Route away from a bomb the unit would plant on `drop`.
///
/// The walk is timed at the unit's speed: it must leave the new bomb's blast
/// before that bomb (or whatever sets it off earlier) detonates, may only
/// cross other blasts while they are not going off, and must end on a cell no
/// pending blast will reach. `budget` caps the number of moves.
pub fn escape_path(ctx: &UnitContext, drop: Position, budget: usize) -> Option<Vec<Position>> {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;
    let margin = ctx.config.fuse_margin_secs;

    let fuse = danger
        .fuse_at(&drop)
        .map_or(ctx.stats.fuse_secs, |f| f.min(ctx.stats.fuse_secs));
    let lane: HashSet<Position> = blast_lane(grid, drop, ctx.stats.blast_radius)
        .into_iter()
        .collect();

    let path = Bfs::find_path(
        grid.bounds(),
        drop,
        budget,
        |pos, steps| {
            if grid.is_blocked(pos) || ctx.is_ally_at(pos) {
                return false;
            }
            let leave = ctx.travel_time(steps + 1);
            if lane.contains(pos) && leave + margin >= fuse {
                return false;
            }
            !ctx.caught_in_passing(pos, steps)
        },
        |pos, steps| {
            let arrival = ctx.travel_time(steps);
            !lane.contains(pos)
                && arrival + margin < fuse
                && danger.fuse_at(pos).is_none_or(|f| f + margin < arrival)
        },
    );

    if path.is_none() {
        debug!("No escape from {:?} within {} moves", drop, budget);
    }
    path
}

/// Nearest cell no blast reaches, ignoring timing. Used when the unit is
/// already standing in a blast lane.
pub fn safety_path(ctx: &UnitContext) -> Option<Vec<Position>> {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;
    Bfs::find_path(
        grid.bounds(),
        ctx.position(),
        ctx.config.max_path_len,
        |pos, _| !grid.is_blocked(pos) && !ctx.is_ally_at(pos),
        |pos, _| !danger.threatens(pos) && !grid.is_danger(pos),
    )
}

/// Path to the nearest cell next to a box that no pending blast will
/// destroy anyway.
pub fn box_adjacency_path(ctx: &UnitContext) -> Option<Vec<Position>> {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;
    find_path(ctx, |pos| {
        !danger.threatens(pos)
            && pos
                .neighbors()
                .iter()
                .any(|n| grid.is_box(n) && !danger.threatens(n))
    })
}

/// Best-effort walk toward `goal`, which may itself be unreachable: ends on
/// the reachable cell closest to it, preferring cells outside any blast.
pub fn approach(ctx: &UnitContext, goal: Position) -> Option<Vec<Position>> {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;
    let reach = Bfs::flood(grid.bounds(), ctx.position(), ctx.config.max_path_len, |pos, steps| {
        ctx.can_step(pos, steps)
    });

    let (best, _) = reach
        .cells()
        .iter()
        .min_by_key(|(pos, steps)| (danger.threatens(pos), pos.distance(&goal), *steps))?;
    reach.path_to(*best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::state::fixtures::SnapshotBuilder;
    use crate::state::{ArenaView, Cell, Snapshot};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn with_ctx<R>(snapshot: &Snapshot, f: impl FnOnce(&UnitContext) -> R) -> R {
        let config = EngineConfig::default();
        let view = ArenaView::classify(snapshot, config.critical_fuse_secs);
        let ctx = UnitContext::new(&view, &config, config.stats, &snapshot.units[0], snapshot);
        f(&ctx)
    }

    #[test]
    fn test_escape_leaves_own_blast() {
        let snapshot = SnapshotBuilder::new(5, 5).unit("a", 1, 2, 1).box_at(2, 2).build();
        let path = with_ctx(&snapshot, |ctx| escape_path(ctx, Position::new(1, 2), 10)).unwrap();

        assert_eq!(path[0], Position::new(1, 2));
        // North first: out of the radius-one cross in two moves.
        assert_eq!(path, vec![Position::new(1, 2), Position::new(1, 1), Position::new(1, 0)]);
    }

    #[test]
    fn test_escape_fails_in_dead_end() {
        // Two-cell corridor, the blast covers all of it.
        let snapshot = SnapshotBuilder::new(2, 1).unit("a", 0, 0, 1).build();
        let found = with_ctx(&snapshot, |ctx| escape_path(ctx, Position::new(0, 0), 10));
        assert!(found.is_none());
    }

    #[test]
    fn test_escape_may_cross_lane_that_goes_off_later() {
        // The only way out crosses the lane of a slow bomb at (3, 0).
        let mut builder = SnapshotBuilder::new(5, 5).unit("a", 1, 2, 1).bomb(3, 0, 6.0, 4);
        for y in 0..5 {
            if y != 2 {
                builder = builder.wall(2, y).wall(0, y);
            }
        }
        builder = builder.wall(1, 1).wall(1, 3).wall(0, 2);
        let path = with_ctx(&builder.build(), |ctx| {
            escape_path(ctx, Position::new(1, 2), 10)
        })
        .unwrap();

        assert!(path.contains(&Position::new(3, 2)));
        let end = *path.last().unwrap();
        assert_ne!(end.x, 3);
    }

    #[test]
    fn test_escape_respects_short_fuse() {
        let snapshot = SnapshotBuilder::new(5, 5).unit("a", 1, 2, 1).box_at(2, 2).build();
        let config = EngineConfig::default();
        let view = ArenaView::classify(&snapshot, config.critical_fuse_secs);
        let mut ctx = UnitContext::new(&view, &config, config.stats, &snapshot.units[0], &snapshot);
        ctx.stats.fuse_secs = 0.5;
        assert!(escape_path(&ctx, Position::new(1, 2), 10).is_none());
    }

    #[test]
    fn test_escape_paths_avoid_walls_and_end_safe() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let mut builder = SnapshotBuilder::new(12, 12).unit("a", 6, 6, 1);
            for _ in 0..25 {
                let (x, y) = (rng.random_range(0..12), rng.random_range(0..12));
                if (x, y) != (6, 6) {
                    builder = builder.wall(x, y);
                }
            }
            for _ in 0..2 {
                let (x, y) = (rng.random_range(0..12), rng.random_range(0..12));
                if (x, y) != (6, 6) {
                    builder = builder.bomb(x, y, rng.random_range(0.5..8.0), rng.random_range(1..4));
                }
            }
            let snapshot = builder.build();
            with_ctx(&snapshot, |ctx| {
                let drop = Position::new(6, 6);
                let Some(path) = escape_path(ctx, drop, 20) else {
                    return;
                };
                assert!(path.iter().all(|p| ctx.view.grid.get(p) != Some(Cell::Wall)));
                let end = *path.last().unwrap();
                let arrival = ctx.travel_time(path.len() - 1);
                let lane = blast_lane(&ctx.view.grid, drop, ctx.stats.blast_radius);
                assert!(!lane.contains(&end));
                assert!(ctx.view.danger.fuse_at(&end).is_none_or(|f| f < arrival));
            });
        }
    }

    #[test]
    fn test_safety_path_reaches_unthreatened_cell() {
        let snapshot = SnapshotBuilder::new(5, 5).unit("a", 2, 2, 1).bomb(2, 1, 0.8, 2).build();
        let path = with_ctx(&snapshot, |ctx| safety_path(ctx)).unwrap();
        let end = *path.last().unwrap();
        assert!(end.x != 2 && end.y != 1);
    }

    #[test]
    fn test_box_adjacency_ignores_doomed_boxes() {
        // The box at (2, 0) sits in the bomb's blast and will go anyway.
        let snapshot = SnapshotBuilder::new(7, 3)
            .unit("a", 0, 0, 0)
            .box_at(2, 0)
            .bomb(2, 2, 5.0, 2)
            .box_at(6, 2)
            .build();
        let path = with_ctx(&snapshot, |ctx| box_adjacency_path(ctx)).unwrap();
        let end = *path.last().unwrap();
        assert!(end.is_adjacent(&Position::new(6, 2)));
        assert!(!end.is_adjacent(&Position::new(2, 0)));
    }

    #[test]
    fn test_approach_stops_closest_to_unreachable_goal() {
        let mut builder = SnapshotBuilder::new(7, 7).unit("a", 0, 3, 1);
        for y in 0..7 {
            builder = builder.wall(4, y);
        }
        let path = with_ctx(&builder.build(), |ctx| approach(ctx, Position::new(6, 3))).unwrap();
        assert_eq!(path.last(), Some(&Position::new(3, 3)));
    }
}

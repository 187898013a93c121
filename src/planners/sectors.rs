use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::infra::{Bounds, Position};
use crate::planners::UnitContext;
use crate::state::{Snapshot, blast_lane};

/// Exploration anchors of a `width` x `height` map: the four quadrant
/// centres followed by the four mid-edge points, clamped onto the map.
pub fn anchors(width: i32, height: i32) -> Vec<Position> {
    if width <= 0 || height <= 0 {
        return Vec::new();
    }
    let bounds = Bounds::of_map(width, height);
    let raw = [
        Position::new(width / 4, height / 4),
        Position::new(3 * width / 4, height / 4),
        Position::new(width / 4, 3 * height / 4),
        Position::new(3 * width / 4, 3 * height / 4),
        Position::new(width / 2, 1),
        Position::new(width / 2, height - 2),
        Position::new(1, height / 2),
        Position::new(width - 2, height / 2),
    ];

    let mut out: Vec<Position> = Vec::with_capacity(raw.len());
    for pos in raw {
        let pos = bounds.clamp(pos);
        if !out.contains(&pos) {
            out.push(pos);
        }
    }
    out
}

/// Spreads living units over the map by handing each one an anchor to
/// explore toward. Assignments persist across ticks until the anchor is
/// reached.
#[derive(Debug, Clone, Default)]
pub struct SectorCoordinator {
    anchors: Vec<Position>,
    map_size: Position,
    assignments: HashMap<String, Position>,
    visited: HashSet<Position>,
}

impl SectorCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.anchors.clear();
        self.map_size = Position::default();
        self.assignments.clear();
        self.visited.clear();
    }

    /// Forget the assignments of units not in `living`.
    pub fn retain_units(&mut self, living: &HashSet<&str>) {
        self.assignments.retain(|id, _| living.contains(id.as_str()));
    }

    /// Hand every living unit an anchor, in id order.
    ///
    /// A unit keeps last tick's anchor while it is unreached and nobody
    /// earlier claimed it. Everyone else gets the free anchor farthest from
    /// those already claimed this tick, closest to the unit on ties.
    #[tracing::instrument(level = "debug", skip(self, snapshot), fields(round = %snapshot.round))]
    pub fn assign(&mut self, snapshot: &Snapshot, reached_dist: i32) {
        if self.map_size != snapshot.map_size {
            self.anchors = anchors(snapshot.width(), snapshot.height());
            self.map_size = snapshot.map_size;
            self.assignments.clear();
            self.visited.clear();
        }
        if self.anchors.is_empty() {
            return;
        }

        let mut units: Vec<_> = snapshot.living_units().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));

        for unit in &units {
            for anchor in &self.anchors {
                if anchor.distance(&unit.pos) <= reached_dist {
                    self.visited.insert(*anchor);
                }
            }
        }
        if self.anchors.iter().all(|a| self.visited.contains(a)) {
            debug!("All {} anchors visited, starting over", self.anchors.len());
            self.visited.clear();
        }

        let mut claimed: Vec<Position> = Vec::new();
        let mut next: HashMap<String, Position> = HashMap::new();

        for unit in &units {
            if let Some(&prev) = self.assignments.get(&unit.id)
                && !self.visited.contains(&prev)
                && !claimed.contains(&prev)
            {
                claimed.push(prev);
                next.insert(unit.id.clone(), prev);
            }
        }

        for unit in &units {
            if next.contains_key(&unit.id) {
                continue;
            }
            let free: Vec<(usize, Position)> = self
                .anchors
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, a)| !claimed.contains(a))
                .collect();
            let unvisited: Vec<(usize, Position)> = free
                .iter()
                .copied()
                .filter(|(_, a)| !self.visited.contains(a))
                .collect();
            let candidates = if unvisited.is_empty() { free } else { unvisited };

            let Some((_, anchor)) = candidates.into_iter().min_by_key(|(index, anchor)| {
                let spread = claimed
                    .iter()
                    .map(|c| c.distance(anchor))
                    .min()
                    .unwrap_or(i32::MAX);
                (Reverse(spread), anchor.distance(&unit.pos), *index)
            }) else {
                // More units than anchors.
                continue;
            };

            debug!("Unit {} explores toward anchor {:?}", unit.id, anchor);
            claimed.push(anchor);
            next.insert(unit.id.clone(), anchor);
        }

        self.assignments = next;
    }

    pub fn anchor_for(&self, unit_id: &str) -> Option<Position> {
        self.assignments.get(unit_id).copied()
    }

    pub fn assignments(&self) -> &HashMap<String, Position> {
        &self.assignments
    }

    /// Anchors held by units other than `unit_id`.
    pub fn anchors_except<'a>(&'a self, unit_id: &'a str) -> impl Iterator<Item = Position> + 'a {
        self.assignments
            .iter()
            .filter(move |(id, _)| id.as_str() != unit_id)
            .map(|(_, pos)| *pos)
    }

    pub fn anchor_points(&self) -> &[Position] {
        &self.anchors
    }
}

/// Local move used when a unit's target collides with another unit's:
/// the enterable neighbour farthest from the nearest ally, then closest to
/// a box nobody is already going to blow up.
pub fn separation_step(ctx: &UnitContext, claimed_drops: &[Position]) -> Option<Position> {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;

    let claimed_lanes: HashSet<Position> = claimed_drops
        .iter()
        .flat_map(|drop| blast_lane(grid, *drop, ctx.stats.blast_radius))
        .collect();
    let open_boxes: Vec<&Position> = grid
        .boxes()
        .filter(|b| !danger.threatens(b) && !claimed_lanes.contains(b))
        .collect();

    ctx.position()
        .neighbors()
        .into_iter()
        .filter(|n| ctx.can_step(n, 1))
        .max_by_key(|n| {
            let ally_dist = ctx
                .allies
                .iter()
                .map(|a| a.distance(n))
                .min()
                .unwrap_or(i32::MAX);
            let box_dist = open_boxes
                .iter()
                .map(|b| b.distance(n))
                .min()
                .unwrap_or(i32::MAX);
            (ally_dist, Reverse(box_dist), Reverse(*n))
        })
}

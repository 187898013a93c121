use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::infra::{Bfs, Position};
use crate::planners::{UnitContext, path};
use crate::state::blast_lane;

/// What a bomb planted on a given cell would hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DropValue {
    /// Boxes not already doomed by a pending blast.
    pub boxes: usize,
    pub hostiles: usize,
    /// A living ally stands in the blast.
    pub hits_ally: bool,
}

impl DropValue {
    pub fn is_worthwhile(&self) -> bool {
        self.boxes > 0 || self.hostiles > 0
    }

    pub fn score(&self, ctx: &UnitContext) -> i64 {
        (self.boxes as i64).pow(ctx.config.box_weight_exponent)
            + self.hostiles as i64 * ctx.config.hostile_weight as i64
    }
}

/// A bomb-drop position, the route there and the verified way out.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackPlan {
    pub drop: Position,
    /// Unit position to `drop`, both included.
    pub approach: Vec<Position>,
    /// `drop` to a safe cell, both included.
    pub escape: Vec<Position>,
    pub value: DropValue,
    pub score: i64,
}

impl AttackPlan {
    pub fn total_len(&self) -> usize {
        self.approach.len().saturating_sub(1) + self.escape.len().saturating_sub(1)
    }

    pub fn is_ready(&self) -> bool {
        self.approach.len() <= 1
    }
}

/// Evaluate a bomb on `drop`. Hostiles only count during the aggressive
/// opening.
pub fn evaluate_drop(ctx: &UnitContext, drop: Position, aggressive: bool) -> DropValue {
    let grid = &ctx.view.grid;
    let danger = &ctx.view.danger;
    let lane = blast_lane(grid, drop, ctx.stats.blast_radius);

    DropValue {
        boxes: lane
            .iter()
            .filter(|pos| grid.is_box(pos) && !danger.threatens(pos))
            .count(),
        hostiles: if aggressive {
            lane.iter().filter(|pos| ctx.targets.contains(pos)).count()
        } else {
            0
        },
        hits_ally: ctx.allies.iter().any(|ally| lane.contains(ally)),
    }
}

/// Search every cell within reach for the most valuable safe drop.
///
/// Cells that hit nothing, or would catch an ally, are passed over but the
/// search keeps expanding beyond them. Higher score wins; equal scores go to
/// the shorter approach-plus-escape.
#[tracing::instrument(level = "debug", skip(ctx), fields(unit = %ctx.unit.id))]
pub fn best_attack(ctx: &UnitContext, aggressive: bool) -> Option<AttackPlan> {
    let grid = &ctx.view.grid;
    let max_len = ctx.config.max_path_len;
    let reach = Bfs::flood(grid.bounds(), ctx.position(), max_len, |pos, steps| {
        ctx.can_step(pos, steps)
    });

    let mut best: Option<AttackPlan> = None;
    let beats = |score: i64, total: usize, best: &Option<AttackPlan>| match best {
        None => true,
        Some(b) => score > b.score || (score == b.score && total < b.total_len()),
    };

    for &(cell, steps) in reach.cells() {
        if grid.is_bomb(&cell) {
            continue;
        }
        let value = evaluate_drop(ctx, cell, aggressive);
        if !value.is_worthwhile() || value.hits_ally {
            continue;
        }
        let score = value.score(ctx);
        // Escape takes at least one move.
        if !beats(score, steps + 1, &best) {
            continue;
        }

        let Some(escape) = path::escape_path(ctx, cell, max_len - steps) else {
            continue;
        };
        let total = steps + escape.len() - 1;
        if total > max_len || !beats(score, total, &best) {
            continue;
        }
        let Some(approach) = reach.path_to(cell) else {
            continue;
        };

        best = Some(AttackPlan {
            drop: cell,
            approach,
            escape,
            value,
            score,
        });
    }

    if let Some(plan) = &best {
        debug!(
            "Best drop {:?}: {} boxes, {} hostiles, score {}, {} moves",
            plan.drop,
            plan.value.boxes,
            plan.value.hostiles,
            plan.score,
            plan.total_len()
        );
    }
    best
}

/// Rebuild the plan for a drop position chosen on an earlier tick, or
/// `None` when it is no longer worth it, reachable or escapable.
pub fn follow_commitment(
    ctx: &UnitContext,
    commitment: &Commitment,
    aggressive: bool,
) -> Option<AttackPlan> {
    let drop = commitment.drop;
    if ctx.view.grid.is_bomb(&drop) {
        return None;
    }
    let value = evaluate_drop(ctx, drop, aggressive);
    if !value.is_worthwhile() || value.hits_ally {
        return None;
    }

    let approach = path::path_to(ctx, drop)?;
    let steps = approach.len() - 1;
    let escape = path::escape_path(ctx, drop, ctx.config.max_path_len.checked_sub(steps)?)?;

    Some(AttackPlan {
        drop,
        approach,
        escape,
        value,
        score: value.score(ctx),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commitment {
    pub drop: Position,
    pub score: i64,
    /// The unit had to flee since committing.
    pub retreated: bool,
}

/// Per-unit drop positions the units are walking toward.
#[derive(Debug, Clone, Default)]
pub struct AttackMemory {
    entries: HashMap<String, Commitment>,
}

impl AttackMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, unit_id: &str) -> Option<&Commitment> {
        self.entries.get(unit_id)
    }

    pub fn commit(&mut self, unit_id: &str, drop: Position, score: i64) {
        self.entries.insert(
            unit_id.to_string(),
            Commitment {
                drop,
                score,
                retreated: false,
            },
        );
    }

    pub fn forget(&mut self, unit_id: &str) {
        self.entries.remove(unit_id);
    }

    pub fn mark_retreated(&mut self, unit_id: &str) {
        if let Some(commitment) = self.entries.get_mut(unit_id) {
            commitment.retreated = true;
        }
    }

    /// Drop entries of units not in `living`.
    pub fn retain_units(&mut self, living: &HashSet<&str>) {
        self.entries.retain(|id, _| living.contains(id.as_str()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop positions committed to by units other than `unit_id`.
    pub fn drops_except<'a>(&'a self, unit_id: &'a str) -> impl Iterator<Item = Position> + 'a {
        self.entries
            .iter()
            .filter(move |(id, _)| id.as_str() != unit_id)
            .map(|(_, c)| c.drop)
    }
}

use crate::config::{EngineConfig, UnitStats};
use crate::infra::Position;
use crate::state::{ArenaView, Snapshot, Unit};

/// What one unit's planners see during a tick: the classified arena, the
/// engine tuning and the positions of everyone else that matters.
pub struct UnitContext<'a> {
    pub view: &'a ArenaView,
    pub config: &'a EngineConfig,
    pub stats: UnitStats,
    pub unit: &'a Unit,
    /// Living allies other than `unit`.
    pub allies: Vec<Position>,
    /// Hostiles a blast would hurt right now.
    pub targets: Vec<Position>,
}

impl<'a> UnitContext<'a> {
    pub fn new(
        view: &'a ArenaView,
        config: &'a EngineConfig,
        stats: UnitStats,
        unit: &'a Unit,
        snapshot: &Snapshot,
    ) -> Self {
        let allies = snapshot
            .living_units()
            .filter(|u| u.id != unit.id)
            .map(|u| u.pos)
            .collect();
        Self {
            view,
            config,
            stats,
            unit,
            allies,
            targets: snapshot.vulnerable_hostiles().collect(),
        }
    }

    pub fn position(&self) -> Position {
        self.unit.pos
    }

    /// Seconds needed to walk `steps` cells.
    pub fn travel_time(&self, steps: usize) -> f64 {
        steps as f64 / self.stats.speed.max(0.1)
    }

    pub fn is_ally_at(&self, pos: &Position) -> bool {
        self.allies.contains(pos)
    }

    /// Whether stepping on `pos` would bring the unit inside the buffer
    /// around an ally it is not already that close to.
    pub fn crowds_ally(&self, pos: &Position) -> bool {
        let here = self.position();
        self.allies.iter().any(|ally| {
            let dist = ally.distance(pos);
            dist <= self.config.ally_buffer && dist < ally.distance(&here)
        })
    }

    /// Whether a unit occupying `pos` as its `steps`-th move gets caught by
    /// a blast going off while it stands there.
    pub fn caught_in_passing(&self, pos: &Position, steps: usize) -> bool {
        let enter = self.travel_time(steps);
        let leave = self.travel_time(steps + 1);
        self.view
            .danger
            .is_unsafe_during(pos, enter, leave, self.config.fuse_margin_secs)
    }

    /// Whether the unit's own cell is engulfed before it could step off.
    /// A slower blast over the cell is handled by timed movement instead.
    pub fn in_immediate_danger(&self) -> bool {
        let here = self.position();
        self.view.grid.is_danger(&here) || self.caught_in_passing(&here, 0)
    }

    /// Ordinary movement rule shared by reachability, attack and
    /// exploration searches.
    pub fn can_step(&self, pos: &Position, steps: usize) -> bool {
        let grid = &self.view.grid;
        !grid.is_blocked(pos)
            && !grid.is_danger(pos)
            && !self.crowds_ally(pos)
            && !self.caught_in_passing(pos, steps)
    }
}

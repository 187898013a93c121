use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::{EngineConfig, UnitStats};
use crate::infra::Position;
use crate::planners::attack::{self, AttackMemory, AttackPlan};
use crate::planners::sectors::{self, SectorCoordinator};
use crate::planners::{CommandBatch, UnitCommand, UnitContext, path};
use crate::state::{ArenaView, Snapshot, UnitTracker, UpgradeLevels};

/// What a unit was told to do on the last tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Leaving a blast lane.
    Flee,
    /// No bomb in hand, walking up to a box.
    SeekBox,
    /// Walking to a committed drop position.
    Attack { drop: Position },
    Plant { drop: Position },
    /// Stepping aside because another unit holds the same target.
    Separate,
    Explore { anchor: Position },
    Idle,
}

/// The decision engine. Owns every piece of state that survives between
/// ticks and resets it when the round changes.
pub struct Engine {
    config: EngineConfig,
    stats: UnitStats,
    round: Option<String>,
    round_ticks: u32,
    sectors: SectorCoordinator,
    memory: AttackMemory,
    tracker: UnitTracker,
    decisions: Vec<(String, Decision)>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let stats = config.stats;
        Self {
            config,
            stats,
            round: None,
            round_ticks: 0,
            sectors: SectorCoordinator::new(),
            memory: AttackMemory::new(),
            tracker: UnitTracker::new(),
            decisions: Vec::new(),
        }
    }

    /// Take over the stats the shop reports for our bombers.
    pub fn update_stats(&mut self, levels: &UpgradeLevels) {
        let stats = self.stats.with_levels(levels);
        if stats != self.stats {
            info!(
                "Stats now radius {}, speed {}, fuse {:.1}s, {} bombs",
                stats.blast_radius, stats.speed, stats.fuse_secs, stats.max_bombs
            );
            self.stats = stats;
        }
    }

    /// Forget all coordination state.
    pub fn reset(&mut self) {
        self.round = None;
        self.round_ticks = 0;
        self.sectors.reset();
        self.memory.clear();
        self.decisions.clear();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> UnitStats {
        self.stats
    }

    pub fn round(&self) -> Option<&str> {
        self.round.as_deref()
    }

    pub fn round_ticks(&self) -> u32 {
        self.round_ticks
    }

    pub fn sectors(&self) -> &SectorCoordinator {
        &self.sectors
    }

    pub fn memory(&self) -> &AttackMemory {
        &self.memory
    }

    pub fn tracker(&self) -> &UnitTracker {
        &self.tracker
    }

    pub fn decisions(&self) -> &[(String, Decision)] {
        &self.decisions
    }

    /// Decide this tick's commands. Malformed snapshots yield an empty batch.
    #[tracing::instrument(level = "debug", skip(self, snapshot), fields(round = %snapshot.round))]
    pub fn tick(&mut self, snapshot: &Snapshot) -> CommandBatch {
        self.decisions.clear();
        if !snapshot.is_well_formed() {
            warn!(
                "Ignoring snapshot with map size {}x{}",
                snapshot.width(),
                snapshot.height()
            );
            return CommandBatch::default();
        }

        self.begin_tick(snapshot);
        let view = ArenaView::classify(snapshot, self.config.critical_fuse_secs);
        self.sectors.assign(snapshot, self.config.anchor_reached_dist);
        let aggressive = self.round_ticks <= self.config.aggressive_opening_ticks;

        let config = self.config.clone();
        let mut units: Vec<_> = snapshot.living_units().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));

        let mut claimed: Vec<Position> = Vec::new();
        let mut batch = CommandBatch::default();
        for unit in units {
            let ctx = UnitContext::new(&view, &config, self.stats, unit, snapshot);
            let (decision, command) = self.plan_unit(&ctx, aggressive, &mut claimed);
            debug!("Unit {} at {:?}: {:?}", unit.id, unit.pos, decision);
            self.decisions.push((unit.id.clone(), decision));
            if let Some(command) = command {
                batch.push(command);
            }
        }
        batch
    }

    fn begin_tick(&mut self, snapshot: &Snapshot) {
        if self.round.as_deref() != Some(snapshot.round.as_str()) {
            info!("Round {} started", snapshot.round);
            self.reset();
            self.round = Some(snapshot.round.clone());
        }
        self.round_ticks += 1;

        let living: HashSet<&str> = snapshot.living_units().map(|u| u.id.as_str()).collect();
        self.memory.retain_units(&living);
        self.sectors.retain_units(&living);
        self.tracker.retain_units(&living);
        self.tracker.update(snapshot);
    }

    fn plan_unit(
        &mut self,
        ctx: &UnitContext,
        aggressive: bool,
        claimed: &mut Vec<Position>,
    ) -> (Decision, Option<UnitCommand>) {
        let id = ctx.unit.id.as_str();
        let here = ctx.position();

        if ctx.in_immediate_danger() {
            self.memory.mark_retreated(id);
            return match path::safety_path(ctx) {
                Some(route) if route.len() > 1 => {
                    (Decision::Flee, Some(UnitCommand::move_along(id, &route)))
                }
                _ => {
                    debug!("Unit {} is trapped at {:?}", id, here);
                    (Decision::Idle, None)
                }
            };
        }

        if ctx.unit.bombs_available == 0 {
            match path::box_adjacency_path(ctx) {
                // Already next to a box; nothing to do until a bomb is back.
                Some(route) if route.len() == 1 => return (Decision::Idle, None),
                Some(route) => {
                    return (Decision::SeekBox, Some(UnitCommand::move_along(id, &route)));
                }
                None => return self.explore(ctx),
            }
        }

        let Some(plan) = self.resolve_attack(ctx, aggressive) else {
            return self.explore(ctx);
        };

        let contested = claimed.contains(&plan.drop)
            || self.memory.drops_except(id).any(|d| d == plan.drop)
            || self.sectors.anchors_except(id).any(|a| a == plan.drop);
        if contested {
            debug!("Drop {:?} is taken, unit {} steps aside", plan.drop, id);
            self.memory.forget(id);
            return match sectors::separation_step(ctx, claimed) {
                Some(step) => (
                    Decision::Separate,
                    Some(UnitCommand::move_along(id, &[here, step])),
                ),
                None => self.explore(ctx),
            };
        }

        claimed.push(plan.drop);
        if plan.is_ready() {
            self.memory.forget(id);
            let command = UnitCommand::plant(id, plan.drop, &plan.escape);
            (Decision::Plant { drop: plan.drop }, Some(command))
        } else {
            self.memory.commit(id, plan.drop, plan.score);
            let command = UnitCommand::move_along(id, &plan.approach);
            (Decision::Attack { drop: plan.drop }, Some(command))
        }
    }

    /// Keep walking toward the committed drop unless it stopped being valid,
    /// or the unit fled since and something better showed up.
    fn resolve_attack(&mut self, ctx: &UnitContext, aggressive: bool) -> Option<AttackPlan> {
        let id = ctx.unit.id.as_str();
        let Some(commitment) = self.memory.get(id).copied() else {
            return attack::best_attack(ctx, aggressive);
        };

        match attack::follow_commitment(ctx, &commitment, aggressive) {
            None => {
                debug!("Unit {} drops commitment to {:?}", id, commitment.drop);
                self.memory.forget(id);
                attack::best_attack(ctx, aggressive)
            }
            Some(plan) if !commitment.retreated => Some(plan),
            Some(plan) => match attack::best_attack(ctx, aggressive) {
                Some(fresh) if fresh.score > plan.score => {
                    debug!(
                        "Unit {} switches from {:?} to {:?} after retreating",
                        id, plan.drop, fresh.drop
                    );
                    Some(fresh)
                }
                _ => Some(plan),
            },
        }
    }

    fn explore(&self, ctx: &UnitContext) -> (Decision, Option<UnitCommand>) {
        let id = ctx.unit.id.as_str();
        let Some(anchor) = self.sectors.anchor_for(id) else {
            return (Decision::Idle, None);
        };
        match path::approach(ctx, anchor) {
            Some(route) if route.len() > 1 => (
                Decision::Explore { anchor },
                Some(UnitCommand::move_along(id, &route)),
            ),
            _ => (Decision::Idle, None),
        }
    }
}

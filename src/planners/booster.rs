//! Upgrade purchase advice.
//!
//! Free-form shop labels are mapped onto [`BoosterCategory`] once, at the
//! edge; everything past [`canonicalize`] works with the enum.

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::BoosterLimits;
use crate::state::{ArenaView, Offer, Snapshot, UpgradeLevels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoosterCategory {
    Speed,
    FuseDelay,
    BlastRadius,
    BombCount,
    SquadSize,
    Armor,
    Vision,
    TerrainPass,
}

/// Substring matchers, first hit wins. Order matters: "bomb_delay" and
/// "bomb_range" must resolve before the plain "bomb" entry, "bombers" too.
const LABEL_MATCHERS: [(&str, BoosterCategory); 12] = [
    ("delay", BoosterCategory::FuseDelay),
    ("fuse", BoosterCategory::FuseDelay),
    ("range", BoosterCategory::BlastRadius),
    ("radius", BoosterCategory::BlastRadius),
    ("speed", BoosterCategory::Speed),
    ("pass", BoosterCategory::TerrainPass),
    ("bombers", BoosterCategory::SquadSize),
    ("squad", BoosterCategory::SquadSize),
    ("bomb", BoosterCategory::BombCount),
    ("armor", BoosterCategory::Armor),
    ("view", BoosterCategory::Vision),
    ("vision", BoosterCategory::Vision),
];

pub fn canonicalize(label: &str) -> Option<BoosterCategory> {
    let label = label.to_lowercase();
    LABEL_MATCHERS
        .iter()
        .find(|(needle, _)| label.contains(needle))
        .map(|(_, category)| *category)
}

impl BoosterCategory {
    /// Current level of this stat as the shop reports it.
    pub fn level(self, levels: &UpgradeLevels) -> i32 {
        match self {
            BoosterCategory::Speed => levels.speed,
            BoosterCategory::FuseDelay => levels.bomb_delay,
            BoosterCategory::BlastRadius => levels.bomb_range,
            BoosterCategory::BombCount => levels.bombs,
            BoosterCategory::SquadSize => levels.bombers,
            BoosterCategory::Armor => levels.armor,
            BoosterCategory::Vision => levels.view,
            BoosterCategory::TerrainPass => [
                levels.can_pass_bombs,
                levels.can_pass_obstacles,
                levels.can_pass_walls,
            ]
            .iter()
            .filter(|flag| **flag)
            .count() as i32,
        }
    }

    /// Whether buying one more of this still changes anything.
    pub fn is_useful(self, levels: &UpgradeLevels, limits: &BoosterLimits) -> bool {
        let level = self.level(levels);
        match self {
            BoosterCategory::Speed => level < limits.max_speed,
            // Zero means the shop did not report a delay yet.
            BoosterCategory::FuseDelay => level == 0 || level > limits.min_fuse_ms,
            BoosterCategory::BlastRadius => level < limits.max_radius,
            BoosterCategory::BombCount => level < limits.max_bombs,
            BoosterCategory::SquadSize => level < limits.max_squad,
            BoosterCategory::Armor => level < limits.max_armor,
            BoosterCategory::Vision => level < limits.max_view,
            BoosterCategory::TerrainPass => level < 3,
        }
    }
}

/// One step of a priority list: buy `category` while its level is below
/// `until` (no extra bound when `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityStage {
    pub category: BoosterCategory,
    pub until: Option<i32>,
}

impl PriorityStage {
    const fn new(category: BoosterCategory, until: Option<i32>) -> Self {
        Self { category, until }
    }

    fn applies(&self, levels: &UpgradeLevels, limits: &BoosterLimits) -> bool {
        self.until
            .is_none_or(|until| self.category.level(levels) < until)
            && self.category.is_useful(levels, limits)
    }
}

const STANDARD_PRIORITIES: [PriorityStage; 10] = [
    PriorityStage::new(BoosterCategory::BlastRadius, Some(3)),
    PriorityStage::new(BoosterCategory::FuseDelay, None),
    PriorityStage::new(BoosterCategory::BombCount, Some(3)),
    PriorityStage::new(BoosterCategory::BlastRadius, Some(5)),
    PriorityStage::new(BoosterCategory::BombCount, Some(5)),
    PriorityStage::new(BoosterCategory::Speed, None),
    PriorityStage::new(BoosterCategory::Armor, None),
    PriorityStage::new(BoosterCategory::Vision, None),
    PriorityStage::new(BoosterCategory::SquadSize, None),
    PriorityStage::new(BoosterCategory::TerrainPass, None),
];

pub const AGGRESSIVE_PRIORITIES: &[PriorityStage] = &STANDARD_PRIORITIES;
pub const DEFENSIVE_PRIORITIES: &[PriorityStage] = &STANDARD_PRIORITIES;

/// True when some living unit stands next to a hostile or inside a pending
/// blast.
pub fn squad_in_danger(snapshot: &Snapshot) -> bool {
    let view = ArenaView::classify(snapshot, 0.0);
    let hostiles: Vec<_> = snapshot.hostile_positions().collect();
    snapshot.living_units().any(|unit| {
        view.danger.threatens(&unit.pos) || hostiles.iter().any(|h| h.distance(&unit.pos) <= 1)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoosterChoice {
    /// Index into the offered list.
    pub index: usize,
    pub category: BoosterCategory,
    pub cost: i32,
}

/// Pick at most one offer to buy. `budget` further caps the shop's own
/// point count.
#[tracing::instrument(level = "debug", skip_all, fields(points = levels.points, budget = budget))]
pub fn choose_booster(
    offers: &[Offer],
    levels: &UpgradeLevels,
    snapshot: &Snapshot,
    limits: &BoosterLimits,
    budget: i32,
) -> Option<BoosterChoice> {
    let budget = levels.points.min(budget);
    if budget <= 0 || offers.is_empty() {
        return None;
    }

    let priorities = if squad_in_danger(snapshot) {
        debug!("Squad under pressure, defensive priorities");
        DEFENSIVE_PRIORITIES
    } else {
        AGGRESSIVE_PRIORITIES
    };

    let categorized: Vec<(usize, BoosterCategory, i32)> = offers
        .iter()
        .enumerate()
        .filter_map(|(index, offer)| {
            let category = canonicalize(&offer.label);
            if category.is_none() {
                debug!("Unknown booster label {:?}", offer.label);
            }
            category.map(|c| (index, c, offer.cost))
        })
        .collect();

    for stage in priorities {
        if !stage.applies(levels, limits) {
            continue;
        }
        let cheapest = categorized
            .iter()
            .filter(|(_, category, cost)| *category == stage.category && *cost <= budget)
            .min_by_key(|(index, _, cost)| (*cost, *index));
        if let Some(&(index, category, cost)) = cheapest {
            info!("Buying {:?} for {} points", category, cost);
            return Some(BoosterChoice {
                index,
                category,
                cost,
            });
        }
    }
    None
}

const SECS_PER_POINT: i64 = 90;
const MAX_POINTS_PER_ROUND: i32 = 10;

/// Points the squad may spend this round: one per 90 s of round time, at
/// most ten per round, minus what was already spent.
#[derive(Debug, Clone, Default)]
pub struct SkillPointLedger {
    round: String,
    started: Option<OffsetDateTime>,
    spent: i32,
}

impl SkillPointLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the clock when `round` differs from the tracked one. Empty
    /// round ids are ignored.
    pub fn update_round(&mut self, round: &str, now: OffsetDateTime) {
        if round.is_empty() || self.round == round {
            return;
        }
        self.round = round.to_string();
        self.started = Some(now);
        self.spent = 0;
    }

    pub fn earned(&self, now: OffsetDateTime) -> i32 {
        let Some(started) = self.started else {
            return 0;
        };
        let points = (now - started).whole_seconds() / SECS_PER_POINT;
        points.clamp(0, MAX_POINTS_PER_ROUND as i64) as i32
    }

    pub fn remaining(&self, now: OffsetDateTime) -> i32 {
        (self.earned(now) - self.spent).max(0)
    }

    pub fn spend(&mut self, points: i32) {
        if points > 0 {
            self.spent = (self.spent + points).min(MAX_POINTS_PER_ROUND);
        }
    }
}

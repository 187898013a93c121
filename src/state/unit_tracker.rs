use std::collections::{HashMap, HashSet};

use crate::infra::Position;
use crate::state::Snapshot;

/// Distance walked by each unit during the current round.
#[derive(Debug, Clone, Default)]
pub struct UnitTracker {
    round: String,
    last_pos: HashMap<String, Position>,
    steps: HashMap<String, i32>,
}

impl UnitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "trace", skip(self, snapshot), fields(units = snapshot.units.len()))]
    pub fn update(&mut self, snapshot: &Snapshot) {
        if self.round != snapshot.round {
            self.round = snapshot.round.clone();
            self.last_pos = snapshot
                .living_units()
                .map(|u| (u.id.clone(), u.pos))
                .collect();
            self.steps = snapshot.living_units().map(|u| (u.id.clone(), 0)).collect();
            return;
        }

        for unit in snapshot.living_units() {
            if let Some(prev) = self.last_pos.insert(unit.id.clone(), unit.pos) {
                *self.steps.entry(unit.id.clone()).or_default() += prev.distance(&unit.pos);
            }
        }
    }

    pub fn steps(&self, unit_id: &str) -> i32 {
        self.steps.get(unit_id).copied().unwrap_or(0)
    }

    pub fn is_tracked(&self, unit_id: &str) -> bool {
        self.last_pos.contains_key(unit_id)
    }

    /// Forget units not in `living`.
    pub fn retain_units(&mut self, living: &HashSet<&str>) {
        self.last_pos.retain(|id, _| living.contains(id.as_str()));
        self.steps.retain(|id, _| living.contains(id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::SnapshotBuilder;

    #[test]
    fn test_steps_accumulate_within_round_and_reset_on_new_round() {
        let mut tracker = UnitTracker::new();
        tracker.update(&SnapshotBuilder::new(9, 9).round("r1").unit("a", 0, 0, 1).build());
        tracker.update(&SnapshotBuilder::new(9, 9).round("r1").unit("a", 2, 1, 1).build());
        assert_eq!(tracker.steps("a"), 3);

        tracker.update(&SnapshotBuilder::new(9, 9).round("r2").unit("a", 5, 5, 1).build());
        assert_eq!(tracker.steps("a"), 0);
        assert_eq!(tracker.steps("unknown"), 0);
    }

    #[test]
    fn test_dead_units_are_not_counted_or_kept() {
        let mut tracker = UnitTracker::new();
        tracker.update(
            &SnapshotBuilder::new(9, 9)
                .unit("a", 0, 0, 1)
                .unit("b", 1, 1, 1)
                .build(),
        );
        tracker.update(
            &SnapshotBuilder::new(9, 9)
                .unit("a", 1, 0, 1)
                .dead_unit("b", 4, 4)
                .build(),
        );
        assert_eq!(tracker.steps("a"), 1);
        assert_eq!(tracker.steps("b"), 0);

        let living: HashSet<&str> = ["a"].into_iter().collect();
        tracker.retain_units(&living);
        assert!(tracker.is_tracked("a"));
        assert!(!tracker.is_tracked("b"));
    }
}

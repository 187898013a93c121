use std::time::Duration;

use crate::planners::{BoosterChoice, CommandBatch, Engine};
use crate::state::{Offer, Snapshot};

/// Trait for observing the replay loop
pub trait TickObserver {
    /// Called when the snapshot stream enters a new round
    fn on_round_start(&mut self, round: &str, map_width: i32, map_height: i32);

    /// Called after the engine decided a tick
    fn on_tick(
        &mut self,
        tick: usize,
        snapshot: &Snapshot,
        engine: &Engine,
        batch: &CommandBatch,
        elapsed: Duration,
    );

    /// Called when the booster advisor picked an offer
    fn on_booster_selected(&mut self, _offer: &Offer, _choice: &BoosterChoice) {
        // Default implementation does nothing
    }

    /// Called when the replay is exhausted
    fn on_finished(&mut self, ticks: usize, raw_score: i64);
}

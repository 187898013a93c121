use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{Level, debug, info, trace, warn};

use crate::infra::TickObserver;
use crate::planners::{BoosterChoice, CommandBatch, Engine};
use crate::state::{ArenaView, Offer, Snapshot};

/// Ticks slower than this get a warning.
const SLOW_TICK: Duration = Duration::from_millis(100);

pub struct DefaultObserver;

impl TickObserver for DefaultObserver {
    fn on_round_start(&mut self, round: &str, map_width: i32, map_height: i32) {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let started = now.format(&Rfc3339).unwrap_or_default();
        info!("Round {} started at {}", round, started);
        info!("- map size: {}x{}", map_width, map_height);
    }

    fn on_tick(
        &mut self,
        tick: usize,
        snapshot: &Snapshot,
        engine: &Engine,
        batch: &CommandBatch,
        elapsed: Duration,
    ) {
        info!(
            "tick: {}, units: {}, commands: {}, score: {}",
            tick,
            snapshot.living_units().count(),
            batch.len(),
            snapshot.raw_score
        );
        if tracing::enabled!(Level::TRACE) {
            let view = ArenaView::classify(snapshot, engine.config().critical_fuse_secs);
            trace!("\n{}", view.grid.draw_ascii());
        }
        for (id, decision) in engine.decisions() {
            debug!(
                "- {}: {:?} ({} steps this round)",
                id,
                decision,
                engine.tracker().steps(id)
            );
        }
        if elapsed > SLOW_TICK {
            warn!(
                "Tick {} took {:.2}ms",
                tick,
                elapsed.as_secs_f64() * 1000.0
            );
        }
    }

    fn on_booster_selected(&mut self, offer: &Offer, choice: &BoosterChoice) {
        info!(
            "Booster: {} ({:?}) for {} points",
            offer.label, choice.category, choice.cost
        );
    }

    fn on_finished(&mut self, ticks: usize, raw_score: i64) {
        info!("Replay finished after {} ticks", ticks);
        info!("Final score: {}", raw_score);
    }
}

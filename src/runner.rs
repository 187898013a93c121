use std::io::BufRead;
use std::time::Instant;

use time::OffsetDateTime;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::config::{BoosterLimits, RunnerConfig};
use crate::infra::TickObserver;
use crate::planners::{Engine, SkillPointLedger, choose_booster};
use crate::replay::{Frame, ReplayError, ReplayReader};

/// Totals of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub commands: usize,
    pub purchases: usize,
}

/// Feeds recorded frames through the engine at a fixed pace.
pub struct Runner {
    engine: Engine,
    observer: Box<dyn TickObserver>,
    ledger: SkillPointLedger,
    limits: BoosterLimits,
    config: RunnerConfig,
    clock: Box<dyn FnMut() -> OffsetDateTime>,
}

impl Runner {
    pub fn new(engine: Engine, observer: impl TickObserver + 'static, config: RunnerConfig) -> Self {
        Self {
            engine,
            observer: Box::new(observer),
            ledger: SkillPointLedger::new(),
            limits: BoosterLimits::default(),
            config,
            clock: Box::new(OffsetDateTime::now_utc),
        }
    }

    /// Replace the wall clock driving the skill-point ledger.
    pub fn with_clock(mut self, clock: impl FnMut() -> OffsetDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub async fn run<R: BufRead>(
        &mut self,
        frames: ReplayReader<R>,
    ) -> Result<RunSummary, ReplayError> {
        let mut pacer = self.pacer();
        let mut summary = RunSummary::default();
        let mut raw_score = 0;

        for frame in frames {
            let frame = frame?;
            if let Some(pacer) = pacer.as_mut() {
                pacer.tick().await;
            }

            summary.ticks += 1;
            raw_score = frame.snapshot.raw_score;
            self.step(summary.ticks, &frame, &mut summary)?;
        }

        info!("Replay done: {:?}", summary);
        self.observer.on_finished(summary.ticks, raw_score);
        Ok(summary)
    }

    fn pacer(&self) -> Option<Interval> {
        if self.config.tick_interval.is_zero() {
            return None;
        }
        let mut pacer = interval(self.config.tick_interval);
        pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(pacer)
    }

    fn step(
        &mut self,
        tick: usize,
        frame: &Frame,
        summary: &mut RunSummary,
    ) -> Result<(), ReplayError> {
        let snapshot = &frame.snapshot;
        let now = (self.clock)();

        if snapshot.is_well_formed() && self.engine.round() != Some(snapshot.round.as_str()) {
            self.observer
                .on_round_start(&snapshot.round, snapshot.width(), snapshot.height());
        }
        self.ledger.update_round(&snapshot.round, now);

        if let Some(shop) = &frame.booster {
            self.engine.update_stats(&shop.state);
            if self.config.boosters {
                let budget = self.ledger.remaining(now);
                let choice =
                    choose_booster(&shop.available, &shop.state, snapshot, &self.limits, budget);
                if let Some(choice) = choice
                    && let Some(offer) = shop.available.get(choice.index)
                {
                    self.ledger.spend(choice.cost);
                    summary.purchases += 1;
                    self.observer.on_booster_selected(offer, &choice);
                }
            }
        }

        let started = Instant::now();
        let batch = self.engine.tick(snapshot);
        let elapsed = started.elapsed();

        debug!("commands: {}", serde_json::to_string(&batch)?);
        summary.commands += batch.len();
        self.observer
            .on_tick(tick, snapshot, &self.engine, &batch, elapsed);
        Ok(())
    }
}

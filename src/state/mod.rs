mod arena;
mod danger;
mod grid;
mod unit_tracker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use arena::{Arena, Bomb, Enemy, Mob, Offer, ShopState, Snapshot, Unit, UpgradeLevels};
pub use danger::{BlastZone, DangerMap, blast_lane};
pub use grid::{ArenaView, Cell, Grid};
pub use unit_tracker::UnitTracker;

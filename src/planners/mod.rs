pub mod attack;
pub mod booster;
mod command;
mod context;
pub mod engine;
pub mod path;
pub mod sectors;

pub use attack::{AttackMemory, AttackPlan};
pub use booster::{BoosterCategory, BoosterChoice, SkillPointLedger, choose_booster};
pub use command::{CommandBatch, UnitCommand};
pub use context::UnitContext;
pub use engine::{Decision, Engine};
pub use sectors::SectorCoordinator;

pub mod config;
pub mod infra;
pub mod planners;
pub mod replay;
pub mod runner;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{BoosterLimits, EngineConfig, RunnerConfig, UnitStats};
pub use infra::{Bounds, Position};
pub use planners::{CommandBatch, Engine, UnitCommand};
pub use state::Snapshot;

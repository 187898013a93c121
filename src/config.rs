use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::state::UpgradeLevels;

/// Movement and bomb stats of our bombers, as last observed from the shop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub blast_radius: i32,
    /// Cells per second.
    pub speed: f64,
    pub fuse_secs: f64,
    pub max_bombs: i32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            blast_radius: 1,
            speed: 2.0,
            fuse_secs: 8.0,
            max_bombs: 1,
        }
    }
}

impl UnitStats {
    /// Overlay the shop's reported levels; unreported (zero) levels keep the
    /// current value.
    pub fn with_levels(self, levels: &UpgradeLevels) -> Self {
        Self {
            blast_radius: if levels.bomb_range > 0 {
                levels.bomb_range
            } else {
                self.blast_radius
            },
            speed: if levels.speed > 0 {
                levels.speed as f64
            } else {
                self.speed
            },
            fuse_secs: if levels.bomb_delay > 0 {
                levels.bomb_delay as f64 / 1000.0
            } else {
                self.fuse_secs
            },
            max_bombs: if levels.bombs > 0 {
                levels.bombs
            } else {
                self.max_bombs
            },
        }
    }
}

/// Tuning of the decision engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Longest route any search may return, in moves.
    pub max_path_len: usize,
    /// Blasts due within this many seconds mark their cells as danger.
    pub critical_fuse_secs: f64,
    /// Slack around a detonation during which a cell counts as exploding.
    pub fuse_margin_secs: f64,
    /// Moves may not bring a unit within this distance of an ally.
    pub ally_buffer: i32,
    /// Ticks from round start during which hostiles are attack targets.
    pub aggressive_opening_ticks: u32,
    /// Distance at which an exploration anchor counts as visited.
    pub anchor_reached_dist: i32,
    pub box_weight_exponent: u32,
    pub hostile_weight: i32,
    pub stats: UnitStats,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_len: 30,
            critical_fuse_secs: 1.5,
            fuse_margin_secs: 0.3,
            ally_buffer: 1,
            aggressive_opening_ticks: 150,
            anchor_reached_dist: 2,
            box_weight_exponent: 2,
            hostile_weight: 2,
            stats: UnitStats::default(),
        }
    }
}

/// Caps past which buying more of an upgrade is useless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoosterLimits {
    pub max_speed: i32,
    pub min_fuse_ms: i32,
    pub max_radius: i32,
    pub max_bombs: i32,
    pub max_squad: i32,
    pub max_armor: i32,
    pub max_view: i32,
}

impl Default for BoosterLimits {
    fn default() -> Self {
        Self {
            max_speed: 5,
            min_fuse_ms: 2000,
            max_radius: 5,
            max_bombs: 5,
            max_squad: 6,
            max_armor: 3,
            max_view: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings of the replay binary, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub replay: PathBuf,
    pub tick_interval: Duration,
    pub boosters: bool,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let replay = env::var("BOMBOT_REPLAY").map_err(|_| ConfigError::Missing("BOMBOT_REPLAY"))?;
        let tick_ms = parse_env("BOMBOT_TICK_MS")?.unwrap_or(400u64);
        let boosters = parse_env("BOMBOT_BOOSTERS")?.unwrap_or(true);

        Ok(Self {
            replay: PathBuf::from(replay),
            tick_interval: Duration::from_millis(tick_ms),
            boosters,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

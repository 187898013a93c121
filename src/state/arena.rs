use serde::{Deserialize, Serialize};

use crate::infra::{Bounds, Position};

/// One arena snapshot as delivered by the game server for a single tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub arena: Arena,
    #[serde(default, rename = "bombers")]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub mobs: Vec<Mob>,
    /// `[width, height]`
    #[serde(default)]
    pub map_size: Position,
    #[serde(default)]
    pub round: String,
    #[serde(default)]
    pub raw_score: i64,
}

impl Snapshot {
    pub fn width(&self) -> i32 {
        self.map_size.x
    }

    pub fn height(&self) -> i32 {
        self.map_size.y
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_map(self.width(), self.height())
    }

    /// Positive dimensions whose cell count fits in `i32`.
    pub fn is_well_formed(&self) -> bool {
        self.width() > 0
            && self.height() > 0
            && self.width().checked_mul(self.height()).is_some()
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.alive)
    }

    /// Positions of every hostile (enemy bomber or mob) on the map.
    pub fn hostile_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.enemies
            .iter()
            .map(|e| e.pos)
            .chain(self.mobs.iter().map(|m| m.pos))
    }

    /// Hostiles a blast would currently hurt.
    pub fn vulnerable_hostiles(&self) -> impl Iterator<Item = Position> + '_ {
        self.enemies
            .iter()
            .filter(|e| e.safe_time <= 0)
            .map(|e| e.pos)
            .chain(self.mobs.iter().filter(|m| m.safe_time <= 0).map(|m| m.pos))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    #[serde(default)]
    pub bombs: Vec<Bomb>,
    /// Destructible boxes.
    #[serde(default, rename = "obstacles")]
    pub boxes: Vec<Position>,
    #[serde(default)]
    pub walls: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub pos: Position,
    /// Seconds until detonation.
    #[serde(rename = "timer")]
    pub fuse: f64,
    #[serde(rename = "range")]
    pub radius: i32,
}

impl Bomb {
    pub fn new(pos: Position, fuse: f64, radius: i32) -> Self {
        Self { pos, fuse, radius }
    }
}

/// One of our own bombers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub pos: Position,
    pub alive: bool,
    #[serde(default)]
    pub bombs_available: u32,
    /// Remaining invulnerability, in milliseconds.
    #[serde(default)]
    pub safe_time: i32,
}

impl Unit {
    pub fn new(id: impl Into<String>, pos: Position, bombs_available: u32) -> Self {
        Self {
            id: id.into(),
            pos,
            alive: true,
            bombs_available,
            safe_time: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: String,
    pub pos: Position,
    #[serde(default)]
    pub safe_time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    pub id: String,
    pub pos: Position,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub safe_time: i32,
}

/// Shop view: purchasable offers plus the current upgrade levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopState {
    #[serde(default)]
    pub available: Vec<Offer>,
    #[serde(default)]
    pub state: UpgradeLevels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub cost: i32,
    #[serde(rename = "type")]
    pub label: String,
}

impl Offer {
    pub fn new(label: impl Into<String>, cost: i32) -> Self {
        Self {
            cost,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub armor: i32,
    /// Fuse delay in milliseconds.
    pub bomb_delay: i32,
    pub bomb_range: i32,
    /// Squad size.
    pub bombers: i32,
    /// Simultaneous bomb capacity.
    pub bombs: i32,
    pub can_pass_bombs: bool,
    pub can_pass_obstacles: bool,
    pub can_pass_walls: bool,
    pub points: i32,
    pub speed: i32,
    pub view: i32,
}

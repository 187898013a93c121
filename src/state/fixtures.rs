//! Snapshot builders for tests.

use crate::infra::Position;
use crate::state::{Bomb, Enemy, Mob, Snapshot, Unit};

pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            snapshot: Snapshot {
                map_size: Position::new(width, height),
                round: "test-round".to_string(),
                ..Snapshot::default()
            },
        }
    }

    pub fn round(mut self, round: &str) -> Self {
        self.snapshot.round = round.to_string();
        self
    }

    pub fn wall(mut self, x: i32, y: i32) -> Self {
        self.snapshot.arena.walls.push(Position::new(x, y));
        self
    }

    pub fn box_at(mut self, x: i32, y: i32) -> Self {
        self.snapshot.arena.boxes.push(Position::new(x, y));
        self
    }

    pub fn bomb(mut self, x: i32, y: i32, fuse: f64, radius: i32) -> Self {
        self.snapshot
            .arena
            .bombs
            .push(Bomb::new(Position::new(x, y), fuse, radius));
        self
    }

    pub fn unit(mut self, id: &str, x: i32, y: i32, bombs: u32) -> Self {
        self.snapshot
            .units
            .push(Unit::new(id, Position::new(x, y), bombs));
        self
    }

    pub fn dead_unit(mut self, id: &str, x: i32, y: i32) -> Self {
        let mut unit = Unit::new(id, Position::new(x, y), 0);
        unit.alive = false;
        self.snapshot.units.push(unit);
        self
    }

    pub fn enemy(mut self, id: &str, x: i32, y: i32) -> Self {
        self.snapshot.enemies.push(Enemy {
            id: id.to_string(),
            pos: Position::new(x, y),
            safe_time: 0,
        });
        self
    }

    pub fn mob(mut self, id: &str, x: i32, y: i32) -> Self {
        self.snapshot.mobs.push(Mob {
            id: id.to_string(),
            pos: Position::new(x, y),
            kind: "patrol".to_string(),
            safe_time: 0,
        });
        self
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}

use serde::{Deserialize, Serialize, Serializer};

use crate::infra::Position;

/// Orders for one unit: cells to walk through (current cell excluded) and
/// optionally a bomb on the cell it stands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCommand {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Position>,
    #[serde(
        default,
        rename = "bombs",
        serialize_with = "bomb_as_list",
        deserialize_with = "bomb_from_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub bomb: Option<Position>,
}

impl UnitCommand {
    /// Walk `path`, whose first cell is where the unit stands now.
    pub fn move_along(id: &str, path: &[Position]) -> Self {
        Self {
            id: id.to_string(),
            path: path.iter().skip(1).copied().collect(),
            bomb: None,
        }
    }

    /// Plant on `drop` and walk `escape`, which starts at `drop`.
    pub fn plant(id: &str, drop: Position, escape: &[Position]) -> Self {
        Self {
            bomb: Some(drop),
            ..Self::move_along(id, escape)
        }
    }

    pub fn is_noop(&self) -> bool {
        self.path.is_empty() && self.bomb.is_none()
    }
}

fn bomb_as_list<S: Serializer>(bomb: &Option<Position>, serializer: S) -> Result<S::Ok, S::Error> {
    bomb.as_slice().serialize(serializer)
}

fn bomb_from_list<'de, D>(deserializer: D) -> Result<Option<Position>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bombs: Vec<Position> = Vec::deserialize(deserializer)?;
    Ok(bombs.into_iter().next())
}

/// Everything the engine decided for one tick. Units with nothing useful to
/// do are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBatch {
    #[serde(rename = "bombers")]
    pub commands: Vec<UnitCommand>,
}

impl CommandBatch {
    pub fn push(&mut self, command: UnitCommand) {
        if !command.is_noop() {
            self.commands.push(command);
        }
    }

    pub fn get(&self, unit_id: &str) -> Option<&UnitCommand> {
        self.commands.iter().find(|c| c.id == unit_id)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

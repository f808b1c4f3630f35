use std::fmt;

use serde::{Deserialize, Serialize};

use super::host::{InputState, Vec2};

/// Stable identity of a game entity. Modules and receptors only ever hold this,
/// never the entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Raised by interaction triggers. Receptors react only when `target` is their own entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub instigator: EntityId,
    pub target: EntityId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotFired {
    pub shooter: EntityId,
    pub origin: Vec2,
    pub direction: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGrant {
    pub recipient: EntityId,
    pub item: String,
    pub count: u32,
}

/// External signals queued for the runtime (input devices, triggers, control).
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Input { entity: EntityId, input: InputState },
    Interaction(Interaction),
    Shutdown,
}

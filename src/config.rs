use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::kernel::error::ConfigError;
use crate::kernel::host::Vec2;
use crate::kernel::time::{FIXED_STEP_MS, TICK_MS};
use crate::modules::AnimationClips;

pub const DEFAULT_GRANT_CHANNEL: &str = "item_grants";
pub const DEFAULT_SHOT_CHANNEL: &str = "shots";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_ms: u64,
    pub fixed_step_ms: u64,
    pub max_fixed_steps: u32,
    pub effect_capacity: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            fixed_step_ms: FIXED_STEP_MS,
            max_fixed_steps: 5,
            effect_capacity: 64,
            event_capacity: 100,
        }
    }
}

impl RuntimeConfig {
    pub fn fixed_step_secs(&self) -> f32 {
        self.fixed_step_ms as f32 / 1000.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 || self.fixed_step_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms and fixed_step_ms must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// One module entry. `name` defaults to the kind's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub kind: ModuleKind,
}

impl ModuleConfig {
    pub fn resolved_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.default_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleKind {
    Movement {
        speed: f32,
        jump_velocity: f32,
    },
    Animation {
        #[serde(default)]
        clips: AnimationClips,
    },
    CameraFollow {
        #[serde(default)]
        offset: Vec2,
        smoothing: f32,
    },
    Shooting {
        cooldown: f32,
        projectile_speed: f32,
        projectile_ttl: f32,
        #[serde(default = "default_shot_channel")]
        channel: String,
    },
    Inventory {
        capacity: usize,
        #[serde(default = "default_grant_channel")]
        channel: String,
    },
}

impl ModuleKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            ModuleKind::Movement { .. } => "movement",
            ModuleKind::Animation { .. } => "animation",
            ModuleKind::CameraFollow { .. } => "camera_follow",
            ModuleKind::Shooting { .. } => "shooting",
            ModuleKind::Inventory { .. } => "inventory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Vec2,
    /// `false` spawns a host without body, sprite or animator.
    #[serde(default = "default_true")]
    pub body: bool,
    #[serde(default)]
    pub camera: Option<Vec2>,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceptorConfig {
    pub entity: u32,
    #[serde(flatten)]
    pub kind: ReceptorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceptorKind {
    Pickup {
        item: String,
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default)]
        reusable: bool,
        #[serde(default = "default_grant_channel")]
        channel: String,
    },
    Probe,
}

/// A whole scene: runtime tuning, entities with their brains, receptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub receptors: Vec<ReceptorConfig>,
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let scene: SceneConfig = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime.validate()?;

        let mut ids = HashSet::new();
        for entity in &self.entities {
            if !ids.insert(entity.id) {
                return Err(ConfigError::Invalid(format!("duplicate entity id {}", entity.id)));
            }

            let mut names = HashSet::new();
            for module in &entity.modules {
                if !names.insert(module.resolved_name()) {
                    return Err(ConfigError::Invalid(format!(
                        "entity {} declares module '{}' twice",
                        entity.id,
                        module.resolved_name()
                    )));
                }
                module.kind.validate()?;
            }
        }

        for receptor in &self.receptors {
            if !ids.contains(&receptor.entity) {
                return Err(ConfigError::Invalid(format!("receptor targets unknown entity {}", receptor.entity)));
            }
        }
        Ok(())
    }
}

impl ModuleKind {
    fn validate(&self) -> Result<(), ConfigError> {
        let ok = match self {
            ModuleKind::Movement { speed, jump_velocity } => speed.is_finite() && jump_velocity.is_finite(),
            ModuleKind::Animation { .. } => true,
            ModuleKind::CameraFollow { offset, smoothing } => {
                offset.x.is_finite() && offset.y.is_finite() && *smoothing >= 0.0
            }
            ModuleKind::Shooting { cooldown, projectile_speed, projectile_ttl, .. } => {
                *cooldown >= 0.0 && projectile_speed.is_finite() && *projectile_ttl > 0.0
            }
            ModuleKind::Inventory { capacity, .. } => *capacity > 0,
        };

        if ok {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!("bad parameters for {} module", self.default_name())))
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_count() -> u32 {
    1
}

fn default_grant_channel() -> String {
    DEFAULT_GRANT_CHANNEL.to_string()
}

fn default_shot_channel() -> String {
    DEFAULT_SHOT_CHANNEL.to_string()
}

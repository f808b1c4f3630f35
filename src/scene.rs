use tracing::info;

use crate::config::{EntityConfig, ModuleConfig, ModuleKind, ReceptorConfig, ReceptorKind, SceneConfig};
use crate::kernel::brain::ModularBrain;
use crate::kernel::channel::ChannelRegistry;
use crate::kernel::error::ConfigError;
use crate::kernel::event::{EntityId, ItemGrant, ShotFired};
use crate::kernel::host::sim::SimHost;
use crate::kernel::module::Module;
use crate::kernel::receptor::{Binding, ReceptorBinding};
use crate::kernel::runtime::Runtime;
use crate::modules::{AnimationModule, CameraFollowModule, InventoryModule, MovementModule, ShootingModule};
use crate::receptors::{PickupReceptor, ProbeReceptor};

/// A composed, ready-to-run scene.
pub struct Scene {
    pub runtime: Runtime,
    pub channels: ChannelRegistry,
}

/// Factory turning plain configuration into brains, hosts and receptors.
/// Channels are resolved by name once, here, never per frame.
#[derive(Default)]
pub struct SceneBuilder {
    channels: ChannelRegistry,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing registry, e.g. to pre-wire observers before composing.
    pub fn with_channels(channels: ChannelRegistry) -> Self {
        Self { channels }
    }

    pub fn channels(&mut self) -> &mut ChannelRegistry {
        &mut self.channels
    }

    pub fn build_module(&mut self, config: &ModuleConfig) -> Result<Box<dyn Module>, ConfigError> {
        let name = config.resolved_name();
        let mut module: Box<dyn Module> = match &config.kind {
            ModuleKind::Movement { speed, jump_velocity } => Box::new(MovementModule::new(name, *speed, *jump_velocity)),
            ModuleKind::Animation { clips } => Box::new(AnimationModule::new(name, clips.clone())),
            ModuleKind::CameraFollow { offset, smoothing } => {
                Box::new(CameraFollowModule::new(name, *offset, *smoothing))
            }
            ModuleKind::Shooting { cooldown, projectile_speed, projectile_ttl, channel } => {
                let shots = self.channels.channel::<ShotFired>(channel)?;
                Box::new(ShootingModule::new(name, *cooldown, *projectile_speed, *projectile_ttl, shots))
            }
            ModuleKind::Inventory { capacity, channel } => {
                let grants = self.channels.channel::<ItemGrant>(channel)?;
                Box::new(InventoryModule::new(name, *capacity, grants))
            }
        };
        module.set_active(config.active);
        Ok(module)
    }

    /// Modules are registered in declaration order, which is their dispatch order.
    pub fn build_brain(&mut self, config: &EntityConfig) -> Result<ModularBrain, ConfigError> {
        let mut brain = ModularBrain::new(EntityId(config.id));
        for module in &config.modules {
            let module = self.build_module(module)?;
            brain.register_boxed(module)?;
        }
        Ok(brain)
    }

    pub fn build_host(config: &EntityConfig) -> SimHost {
        let id = EntityId(config.id);
        let host = if config.body { SimHost::new(id, config.position) } else { SimHost::bare(id, config.position) };
        match config.camera {
            Some(camera) => host.with_camera(camera),
            None => host,
        }
    }

    pub fn build_receptor(&mut self, config: &ReceptorConfig) -> Result<Box<dyn Binding>, ConfigError> {
        let entity = EntityId(config.entity);
        let binding: Box<dyn Binding> = match &config.kind {
            ReceptorKind::Pickup { item, count, reusable, channel } => {
                let grants = self.channels.channel::<ItemGrant>(channel)?;
                let receptor = PickupReceptor::new(entity, item, *count, grants).reusable(*reusable);
                Box::new(ReceptorBinding::new(receptor))
            }
            ReceptorKind::Probe => Box::new(ReceptorBinding::new(ProbeReceptor::new(entity))),
        };
        Ok(binding)
    }

    pub fn build(mut self, config: &SceneConfig) -> Result<Scene, ConfigError> {
        config.validate()?;
        let mut runtime = Runtime::new(&config.runtime);

        for entity in &config.entities {
            let brain = self.build_brain(entity)?;
            let host = Self::build_host(entity);
            runtime.spawn(Box::new(host), brain)?;
        }

        for receptor in &config.receptors {
            let binding = self.build_receptor(receptor)?;
            runtime.add_receptor(binding)?;
        }

        info!(
            entities = config.entities.len(),
            receptors = config.receptors.len(),
            channels = self.channels.len(),
            "scene composed"
        );
        Ok(Scene { runtime, channels: self.channels })
    }
}

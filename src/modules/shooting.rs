use tracing::{debug, warn};

use crate::kernel::channel::Channel;
use crate::kernel::event::ShotFired;
use crate::kernel::module::{FrameContext, Module, ModuleState};
use crate::kernel::pool::Effect;
use crate::kernel::host::Vec2;

pub const BUTTON_FIRE: &str = "fire";

/// Spawns pooled projectiles on `fire`, limited by a cooldown.
#[derive(Debug, Clone)]
pub struct ShootingModule {
    state: ModuleState,
    pub cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_ttl: f32,
    pub projectile_kind: String,
    shots: Channel<ShotFired>,
    remaining: f32,
    fired: u64,
}

impl ShootingModule {
    pub fn new(name: &str, cooldown: f32, projectile_speed: f32, projectile_ttl: f32, shots: Channel<ShotFired>) -> Self {
        Self {
            state: ModuleState::new(name),
            cooldown: cooldown.max(0.0),
            projectile_speed,
            projectile_ttl,
            projectile_kind: "projectile".to_string(),
            shots,
            remaining: 0.0,
            fired: 0,
        }
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn shots(&self) -> &Channel<ShotFired> {
        &self.shots
    }
}

impl Module for ShootingModule {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        self.remaining = (self.remaining - ctx.dt).max(0.0);
        if self.remaining > 0.0 || !ctx.host.input().button(BUTTON_FIRE) {
            return Ok(());
        }

        let direction = match ctx.host.sprite() {
            Some(sprite) if sprite.flip_x() => -1.0,
            _ => 1.0,
        };
        let origin = ctx.host.transform().position();
        let shooter = ctx.host.entity();

        let effect = Effect {
            owner: shooter,
            kind: self.projectile_kind.clone(),
            position: origin,
            velocity: Vec2::new(direction * self.projectile_speed, 0.0),
            ttl: self.projectile_ttl,
        };
        if ctx.resources.effects.acquire(effect).is_none() {
            warn!(%shooter, capacity = ctx.resources.effects.capacity(), "effect pool exhausted, shot dropped");
            return Ok(());
        }

        self.remaining = self.cooldown;
        self.fired += 1;
        debug!(%shooter, direction, "shot fired");
        self.shots.publish(ShotFired { shooter, origin, direction });
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::kernel::module::{FrameContext, Module, ModuleState};

const MOVE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationClips {
    pub idle: String,
    pub run: String,
    pub jump: String,
    pub fall: String,
}

impl Default for AnimationClips {
    fn default() -> Self {
        Self { idle: "idle".into(), run: "run".into(), jump: "jump".into(), fall: "fall".into() }
    }
}

/// Picks a clip from the body state and faces the sprite along horizontal motion.
#[derive(Debug, Clone)]
pub struct AnimationModule {
    state: ModuleState,
    clips: AnimationClips,
    current: Option<String>,
}

impl AnimationModule {
    pub fn new(name: &str, clips: AnimationClips) -> Self {
        Self { state: ModuleState::new(name), clips, current: None }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn select(&self, ctx: &FrameContext<'_>) -> (&str, Option<bool>) {
        let Some(body) = ctx.host.body() else {
            return (&self.clips.idle, None);
        };

        let velocity = body.velocity();
        let facing = if velocity.x > MOVE_EPSILON {
            Some(false)
        } else if velocity.x < -MOVE_EPSILON {
            Some(true)
        } else {
            None
        };

        let clip = if !body.is_grounded() {
            if velocity.y > 0.0 { &self.clips.jump } else { &self.clips.fall }
        } else if facing.is_some() {
            &self.clips.run
        } else {
            &self.clips.idle
        };
        (clip, facing)
    }
}

impl Module for AnimationModule {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let (clip, facing) = self.select(ctx);
        let clip = clip.to_string();

        if let (Some(flip), Some(sprite)) = (facing, ctx.host.sprite_mut()) {
            sprite.set_flip_x(flip);
        }

        if self.current.as_deref() != Some(clip.as_str()) {
            if let Some(animator) = ctx.host.animator_mut() {
                animator.play(&clip);
            }
            self.current = Some(clip);
        }
        Ok(())
    }
}

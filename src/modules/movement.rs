use crate::kernel::module::{FrameContext, Module, ModuleState};

pub const AXIS_HORIZONTAL: &str = "horizontal";
pub const BUTTON_JUMP: &str = "jump";

/// Reads input every frame, applies it to the body on fixed steps.
#[derive(Debug, Clone)]
pub struct MovementModule {
    state: ModuleState,
    pub speed: f32,
    pub jump_velocity: f32,
    desired: f32,
    jump_requested: bool,
}

impl MovementModule {
    pub fn new(name: &str, speed: f32, jump_velocity: f32) -> Self {
        Self { state: ModuleState::new(name), speed, jump_velocity, desired: 0.0, jump_requested: false }
    }

    pub fn desired(&self) -> f32 {
        self.desired
    }
}

impl Module for MovementModule {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let input = ctx.host.input();
        self.desired = input.axis(AXIS_HORIZONTAL);
        // Latched until the next fixed step consumes it.
        self.jump_requested |= input.button(BUTTON_JUMP);
        Ok(())
    }

    fn on_fixed_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let jump = std::mem::take(&mut self.jump_requested);

        match ctx.host.body_mut() {
            Some(body) => {
                let mut velocity = body.velocity();
                velocity.x = self.desired * self.speed;
                if jump && body.is_grounded() {
                    velocity.y = self.jump_velocity;
                }
                body.set_velocity(velocity);
            }
            None => {
                // Kinematic hosts: move the transform directly.
                let transform = ctx.host.transform_mut();
                let mut position = transform.position();
                position.x += self.desired * self.speed * ctx.dt;
                transform.set_position(position);
            }
        }
        Ok(())
    }
}

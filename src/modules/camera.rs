use crate::kernel::host::Vec2;
use crate::kernel::module::{FrameContext, Module, ModuleState};

/// Eases the host camera toward the host position in LateUpdate, after movement settled.
#[derive(Debug, Clone)]
pub struct CameraFollowModule {
    state: ModuleState,
    pub offset: Vec2,
    /// Approach rate per second. `0` freezes the camera; large values snap.
    pub smoothing: f32,
}

impl CameraFollowModule {
    pub fn new(name: &str, offset: Vec2, smoothing: f32) -> Self {
        Self { state: ModuleState::new(name), offset, smoothing: smoothing.max(0.0) }
    }
}

impl Module for CameraFollowModule {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_late_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let target = ctx.host.transform().position() + self.offset;
        let t = 1.0 - (-self.smoothing * ctx.dt).exp();

        if let Some(camera) = ctx.host.camera_mut() {
            let position = camera.position().lerp(target, t);
            camera.set_position(position);
        }
        Ok(())
    }
}

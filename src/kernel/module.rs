use std::any::Any;

use super::error::ModuleError;
use super::event::EntityId;
use super::host::Host;
use super::pool::Resources;
use super::time::Tick;

/// Borrowed view of the world handed to every phase call.
pub struct FrameContext<'a> {
    pub tick: Tick,
    /// Seconds covered by this call: frame delta for Update/LateUpdate, fixed step otherwise.
    pub dt: f32,
    pub host: &'a mut dyn Host,
    pub resources: &'a mut Resources,
}

/// Lifecycle bookkeeping shared by every module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleState {
    name: String,
    active: bool,
    host: Option<EntityId>,
}

impl ModuleState {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), active: true, host: None }
    }

    pub fn inactive(name: &str) -> Self {
        Self { active: false, ..Self::new(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Identity of the bound host; `None` until `initialize`.
    pub fn host(&self) -> Option<EntityId> {
        self.host
    }

    pub fn is_initialized(&self) -> bool {
        self.host.is_some()
    }
}

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Pluggable behavior unit driven by a [`ModularBrain`](super::brain::ModularBrain).
///
/// Implementors provide the `on_*` hooks. The brain calls the non-hook methods
/// (`initialize`, `update_module`, ...) which enforce the lifecycle: phases fail
/// before `initialize`, and are silent no-ops while the module is inactive.
pub trait Module: AsAny {
    fn state(&self) -> &ModuleState;
    fn state_mut(&mut self) -> &mut ModuleState;

    fn on_initialize(&mut self, _host: &mut dyn Host) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_fixed_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_late_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        self.state().name()
    }

    fn is_active(&self) -> bool {
        self.state().is_active()
    }

    fn set_active(&mut self, active: bool) {
        self.state_mut().active = active;
    }

    /// Runs one-time setup and binds the host. A second call is an error.
    /// The binding is only recorded once `on_initialize` succeeds.
    fn initialize(&mut self, host: &mut dyn Host) -> Result<(), ModuleError> {
        if self.state().is_initialized() {
            return Err(ModuleError::AlreadyInitialized(self.name().to_string()));
        }
        self.on_initialize(host)?;
        self.state_mut().host = Some(host.entity());
        Ok(())
    }

    fn update_module(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ModuleError> {
        if !ready(self.state())? {
            return Ok(());
        }
        Ok(self.on_update(ctx)?)
    }

    fn fixed_update_module(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ModuleError> {
        if !ready(self.state())? {
            return Ok(());
        }
        Ok(self.on_fixed_update(ctx)?)
    }

    fn late_update_module(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ModuleError> {
        if !ready(self.state())? {
            return Ok(());
        }
        Ok(self.on_late_update(ctx)?)
    }
}

fn ready(state: &ModuleState) -> Result<bool, ModuleError> {
    if !state.is_initialized() {
        return Err(ModuleError::NotInitialized(state.name().to_string()));
    }
    Ok(state.is_active())
}

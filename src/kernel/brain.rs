use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, info, trace, warn};

use super::error::{BrainError, ModuleError};
use super::event::EntityId;
use super::host::Host;
use super::module::{FrameContext, Module};
use super::scheduler::Phase;

/// Typed handle returned by [`ModularBrain::register_module`].
pub struct ModuleKey<M> {
    index: usize,
    _marker: PhantomData<fn() -> M>,
}

impl<M> ModuleKey<M> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<M> Clone for ModuleKey<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ModuleKey<M> {}

impl<M> fmt::Debug for ModuleKey<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleKey({})", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Registering,
    Running,
    /// A module failed in `on_initialize`; the brain is closed for good.
    Failed,
}

/// Composition root for one entity: owns its modules and drives their phases in
/// registration order.
pub struct ModularBrain {
    entity: EntityId,
    modules: Vec<Box<dyn Module>>,
    by_name: HashMap<String, usize>,
    lifecycle: Lifecycle,
}

impl ModularBrain {
    pub fn new(entity: EntityId) -> Self {
        Self { entity, modules: Vec::new(), by_name: HashMap::new(), lifecycle: Lifecycle::Registering }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// True once a module failed during `initialize_all`. A failed brain rejects
    /// registration, initialization and dispatch.
    pub fn is_failed(&self) -> bool {
        self.lifecycle == Lifecycle::Failed
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registration order is dispatch order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name())
    }

    pub fn register_module<M: Module>(&mut self, module: M) -> Result<ModuleKey<M>, BrainError> {
        let index = self.register_boxed(Box::new(module))?;
        Ok(ModuleKey { index, _marker: PhantomData })
    }

    /// Appends an already boxed module (factory output). Returns its dispatch index.
    pub fn register_boxed(&mut self, module: Box<dyn Module>) -> Result<usize, BrainError> {
        let name = module.name().to_string();
        match self.lifecycle {
            Lifecycle::Registering => {}
            Lifecycle::Running => return Err(BrainError::RegistrationClosed(name)),
            Lifecycle::Failed => return Err(BrainError::Failed(self.entity)),
        }
        if self.by_name.contains_key(&name) {
            return Err(BrainError::DuplicateModule(name));
        }

        let index = self.modules.len();
        debug!(entity = %self.entity, module = %name, index, "module registered");
        self.by_name.insert(name, index);
        self.modules.push(module);
        Ok(index)
    }

    /// Binds every module to `host`, in registration order, exactly once.
    ///
    /// If any module fails, the brain is marked failed: modules bound before the
    /// failure keep their binding and no later call can use the brain.
    pub fn initialize_all(&mut self, host: &mut dyn Host) -> Result<(), BrainError> {
        match self.lifecycle {
            Lifecycle::Registering => {}
            Lifecycle::Running => return Err(BrainError::AlreadyInitialized(self.entity)),
            Lifecycle::Failed => return Err(BrainError::Failed(self.entity)),
        }
        if host.entity() != self.entity {
            return Err(BrainError::HostMismatch { expected: self.entity, found: host.entity() });
        }

        for module in self.modules.iter_mut() {
            if let Err(source) = module.initialize(host) {
                self.lifecycle = Lifecycle::Failed;
                warn!(entity = %self.entity, module = module.name(), "initialization failed, brain closed");
                return Err(phase_error(&**module, Phase::Initialize, source));
            }
        }
        self.lifecycle = Lifecycle::Running;
        info!(entity = %self.entity, modules = self.modules.len(), "brain initialized");
        Ok(())
    }

    pub fn dispatch_update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), BrainError> {
        self.dispatch(Phase::Update, ctx)
    }

    pub fn dispatch_fixed_update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), BrainError> {
        self.dispatch(Phase::FixedUpdate, ctx)
    }

    pub fn dispatch_late_update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), BrainError> {
        self.dispatch(Phase::LateUpdate, ctx)
    }

    /// Calls `phase` on every module, active or not; inactive modules no-op themselves.
    /// The first failing module aborts the rest of this dispatch.
    pub fn dispatch(&mut self, phase: Phase, ctx: &mut FrameContext<'_>) -> Result<(), BrainError> {
        match self.lifecycle {
            Lifecycle::Running => {}
            Lifecycle::Registering => return Err(BrainError::NotInitialized(self.entity)),
            Lifecycle::Failed => return Err(BrainError::Failed(self.entity)),
        }

        if phase == Phase::Initialize {
            return Err(BrainError::NotDispatchable(phase));
        }

        trace!(entity = %self.entity, ?phase, tick = ctx.tick.frame, "dispatch");
        for module in self.modules.iter_mut() {
            let result = match phase {
                Phase::Update => module.update_module(ctx),
                Phase::FixedUpdate => module.fixed_update_module(ctx),
                Phase::LateUpdate => module.late_update_module(ctx),
                Phase::Initialize => return Err(BrainError::NotDispatchable(phase)),
            };
            result.map_err(|source| phase_error(&**module, phase, source))?;
        }
        Ok(())
    }

    pub fn find_module_by_name(&self, name: &str) -> Option<&dyn Module> {
        let index = *self.by_name.get(name)?;
        self.modules.get(index).map(|m| &**m)
    }

    pub fn find_module_by_name_mut(&mut self, name: &str) -> Option<&mut (dyn Module + 'static)> {
        let index = *self.by_name.get(name)?;
        self.modules.get_mut(index).map(|m| &mut **m)
    }

    /// First registered module of type `M`.
    pub fn find_module<M: Module>(&self) -> Option<&M> {
        self.modules.iter().find_map(|m| (**m).as_any().downcast_ref::<M>())
    }

    pub fn find_module_mut<M: Module>(&mut self) -> Option<&mut M> {
        self.modules.iter_mut().find_map(|m| (**m).as_any_mut().downcast_mut::<M>())
    }

    /// Named lookup that also checks the concrete type.
    pub fn find_named<M: Module>(&self, name: &str) -> Option<&M> {
        self.find_module_by_name(name)?.as_any().downcast_ref::<M>()
    }

    pub fn find_named_mut<M: Module>(&mut self, name: &str) -> Option<&mut M> {
        self.find_module_by_name_mut(name)?.as_any_mut().downcast_mut::<M>()
    }

    pub fn module<M: Module>(&self, key: ModuleKey<M>) -> Option<&M> {
        (**self.modules.get(key.index)?).as_any().downcast_ref::<M>()
    }

    pub fn module_mut<M: Module>(&mut self, key: ModuleKey<M>) -> Option<&mut M> {
        (**self.modules.get_mut(key.index)?).as_any_mut().downcast_mut::<M>()
    }

    pub fn set_module_active(&mut self, name: &str, active: bool) -> Result<(), BrainError> {
        let module = self
            .find_module_by_name_mut(name)
            .ok_or_else(|| BrainError::UnknownModule(name.to_string()))?;
        module.set_active(active);
        debug!(entity = %self.entity, module = name, active, "module toggled");
        Ok(())
    }
}

impl fmt::Debug for ModularBrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModularBrain")
            .field("entity", &self.entity)
            .field("modules", &self.module_names().collect::<Vec<_>>())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

fn phase_error(module: &dyn Module, phase: Phase, source: ModuleError) -> BrainError {
    BrainError::Phase { module: module.name().to_string(), phase, source }
}

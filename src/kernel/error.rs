use thiserror::Error;

use super::event::EntityId;
use super::scheduler::Phase;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel '{0}' has no constant configured")]
    NoConstant(String),
    #[error("channel '{name}' already registered with payload type {existing}")]
    TypeMismatch { name: String, existing: &'static str },
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module '{0}' is already bound to a host")]
    AlreadyInitialized(String),
    #[error("module '{0}' received a phase call before initialize")]
    NotInitialized(String),
    #[error(transparent)]
    Hook(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("brain of {0} is already initialized")]
    AlreadyInitialized(EntityId),
    #[error("brain of {0} dispatched before initialize_all")]
    NotInitialized(EntityId),
    #[error("brain of {expected} cannot bind host {found}")]
    HostMismatch { expected: EntityId, found: EntityId },
    #[error("module name '{0}' is already registered")]
    DuplicateModule(String),
    #[error("cannot register '{0}' after initialize_all")]
    RegistrationClosed(String),
    #[error("no module named '{0}'")]
    UnknownModule(String),
    #[error("brain of {0} failed to initialize and is unusable")]
    Failed(EntityId),
    #[error("{0:?} is not a per-frame phase; use initialize_all")]
    NotDispatchable(Phase),
    #[error("module '{module}' failed during {phase:?}")]
    Phase {
        module: String,
        phase: Phase,
        #[source]
        source: ModuleError,
    },
}

#[derive(Debug, Error)]
pub enum ReceptorError {
    #[error("receptor of {0} is already subscribed")]
    AlreadyActive(EntityId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Brain(#[from] BrainError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Receptor(#[from] ReceptorError),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("entity {0} is already spawned")]
    DuplicateEntity(EntityId),
    #[error(transparent)]
    Brain(#[from] BrainError),
}

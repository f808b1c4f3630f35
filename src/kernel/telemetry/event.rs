use serde::{Deserialize, Serialize};

use crate::kernel::event::EntityId;
use crate::kernel::scheduler::Phase;
use crate::kernel::time::Tick;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    FrameCompleted {
        tick: Tick,
        fixed_steps: u32,
        effects_expired: usize,
    },

    /// A brain aborted a phase because one of its modules failed.
    PhaseAborted {
        tick: Tick,
        entity: EntityId,
        module: String,
        phase: Phase,
    },

    InteractionRouted {
        tick: Tick,
        target: EntityId,
        delivered: usize,
    },

    SubscriberFailed {
        tick: Tick,
        channel: String,
    },

    Lifecycle(LifecycleEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    EntitySpawned(EntityId),
    EntityDespawned(EntityId),
    Shutdown,
}

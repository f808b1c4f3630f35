use tokio::sync::mpsc;
use tokio::time::{interval, Duration}; // Only for the loop driver
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::brain::ModularBrain;
use super::channel::{Channel, PublishReport};
use super::error::{BrainError, ReceptorError, RuntimeError};
use super::event::{EntityId, Interaction, RuntimeEvent};
use super::host::Host;
use super::module::FrameContext;
use super::pool::Resources;
use super::receptor::Binding;
use super::scheduler::{FramePlan, FrameScheduler, Phase};
use super::telemetry::event::{LifecycleEvent, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::{FrameClock, Tick, MAX_FRAME_SECS};
use crate::config::RuntimeConfig;

/// A host entity and the brain that drives it.
pub struct Entity {
    pub host: Box<dyn Host>,
    pub brain: ModularBrain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub tick: Tick,
    pub plan: FramePlan,
    pub interactions: usize,
    pub effects_expired: usize,
}

/// Host frame loop: owns entities, receptors and shared resources and walks every
/// brain through Update, FixedUpdate (zero or more) and LateUpdate each frame.
pub struct Runtime {
    receiver: mpsc::Receiver<RuntimeEvent>,
    sender: mpsc::Sender<RuntimeEvent>,
    entities: Vec<Entity>,
    receptors: Vec<Box<dyn Binding>>,
    interactions: Channel<Interaction>,
    pub resources: Resources,
    pub scheduler: FrameScheduler,
    pub telemetry: TelemetryRecorder,
    pub tick: Tick,
    tick_ms: u64,
    shutdown_requested: bool,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.event_capacity);
        Self {
            receiver,
            sender,
            entities: Vec::new(),
            receptors: Vec::new(),
            interactions: Channel::named("interactions"),
            resources: Resources::new(config.effect_capacity),
            scheduler: FrameScheduler::new(config.fixed_step_secs(), config.max_fixed_steps),
            telemetry: TelemetryRecorder::new(),
            tick: Tick::new(),
            tick_ms: config.tick_ms,
            shutdown_requested: false,
        }
    }

    /// Producer side of the event queue, for input drivers and triggers.
    pub fn sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.sender.clone()
    }

    pub fn interactions(&self) -> &Channel<Interaction> {
        &self.interactions
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Initializes `brain` against `host` and adds the pair to the frame loop.
    /// Entities are dispatched in spawn order.
    pub fn spawn(&mut self, mut host: Box<dyn Host>, mut brain: ModularBrain) -> Result<EntityId, RuntimeError> {
        let id = host.entity();
        if self.entity(id).is_some() {
            return Err(RuntimeError::DuplicateEntity(id));
        }

        if !brain.is_initialized() {
            brain.initialize_all(&mut *host)?;
        }
        self.entities.push(Entity { host, brain });
        self.telemetry.record(TelemetryEvent::Lifecycle(LifecycleEvent::EntitySpawned(id)));
        info!(entity = %id, "entity spawned");
        Ok(id)
    }

    /// Removes the entity and releases every receptor subscription it held.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity, RuntimeError> {
        let index = self
            .entities
            .iter()
            .position(|e| e.host.entity() == id)
            .ok_or(RuntimeError::UnknownEntity(id))?;

        self.receptors.retain_mut(|binding| {
            if binding.entity() == id {
                binding.deactivate();
                false
            } else {
                true
            }
        });

        self.telemetry.record(TelemetryEvent::Lifecycle(LifecycleEvent::EntityDespawned(id)));
        info!(entity = %id, "entity despawned");
        Ok(self.entities.remove(index))
    }

    /// Subscribes the receptor to the interaction channel for as long as the runtime holds it.
    pub fn add_receptor(&mut self, mut binding: Box<dyn Binding>) -> Result<(), ReceptorError> {
        if !binding.is_active() {
            binding.activate(&self.interactions)?;
        }
        self.receptors.push(binding);
        Ok(())
    }

    pub fn receptor_count(&self) -> usize {
        self.receptors.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.host.entity() == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.host.entity() == id)
    }

    pub fn host(&self, id: EntityId) -> Option<&dyn Host> {
        self.entity(id).map(|e| &*e.host)
    }

    pub fn brain(&self, id: EntityId) -> Option<&ModularBrain> {
        self.entity(id).map(|e| &e.brain)
    }

    pub fn brain_mut(&mut self, id: EntityId) -> Option<&mut ModularBrain> {
        self.entity_mut(id).map(|e| &mut e.brain)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|e| e.host.entity())
    }

    /// Pure Frame Step: applies queued events then runs all phases for `dt` seconds.
    /// MUST NOT await I/O or timers.
    ///
    /// The tick is advanced at the very start; every phase of this frame sees the new tick.
    /// A failing module aborts the remainder of the frame. The frame's time is
    /// banked before Update, so an aborted frame's fixed steps run on the next one.
    pub fn tick_step(&mut self, events: Vec<RuntimeEvent>, dt: f32) -> Result<FrameReport, RuntimeError> {
        self.tick = self.tick.next();
        let tick = self.tick;

        // === 1. EVENTS ===
        let mut interactions = 0;
        for event in events {
            match event {
                RuntimeEvent::Input { entity, input } => match self.entity_mut(entity) {
                    Some(target) => target.host.set_input(input),
                    None => warn!(%entity, "input for unknown entity dropped"),
                },
                RuntimeEvent::Interaction(interaction) => {
                    let report = self.interactions.publish(interaction);
                    self.record_interaction(interaction, &report);
                    interactions += 1;
                }
                RuntimeEvent::Shutdown => {
                    info!("shutdown requested");
                    self.shutdown_requested = true;
                }
            }
        }

        // === 2. UPDATE ===
        // Time is banked first; an aborted Update leaves it for the next frame's fixed steps.
        self.scheduler.accumulate(dt);
        self.dispatch_all(Phase::Update, dt)?;

        // === 3. PLAN ===
        let plan = self.scheduler.plan(dt);

        // === 4. FIXED UPDATE ===
        let mut effects_expired = 0;
        for _ in 0..plan.fixed_steps {
            self.dispatch_all(Phase::FixedUpdate, plan.fixed_dt)?;
            for entity in self.entities.iter_mut() {
                entity.host.step_physics(plan.fixed_dt);
            }
            effects_expired += self.resources.step_effects(plan.fixed_dt);
        }

        // === 5. LATE UPDATE ===
        self.dispatch_all(Phase::LateUpdate, dt)?;

        self.telemetry.record(TelemetryEvent::FrameCompleted {
            tick,
            fixed_steps: plan.fixed_steps,
            effects_expired,
        });
        debug!(tick = tick.frame, fixed_steps = plan.fixed_steps, "frame complete");

        Ok(FrameReport { tick, plan, interactions, effects_expired })
    }

    fn dispatch_all(&mut self, phase: Phase, dt: f32) -> Result<(), RuntimeError> {
        let tick = self.tick;
        for entity in self.entities.iter_mut() {
            let mut ctx = FrameContext { tick, dt, host: &mut *entity.host, resources: &mut self.resources };
            if let Err(e) = entity.brain.dispatch(phase, &mut ctx) {
                if let BrainError::Phase { module, phase, .. } = &e {
                    self.telemetry.record(TelemetryEvent::PhaseAborted {
                        tick,
                        entity: entity.brain.entity(),
                        module: module.clone(),
                        phase: *phase,
                    });
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn record_interaction(&mut self, interaction: Interaction, report: &PublishReport) {
        self.telemetry.record(TelemetryEvent::InteractionRouted {
            tick: self.tick,
            target: interaction.target,
            delivered: report.delivered,
        });
        for _ in &report.failures {
            self.telemetry.record(TelemetryEvent::SubscriberFailed {
                tick: self.tick,
                channel: self.interactions.name().to_string(),
            });
        }
    }

    /// Async Driver Loop. Runs until `cancel` fires, a `Shutdown` event arrives,
    /// or `max_frames` frames have run.
    pub async fn run(&mut self, cancel: CancellationToken, max_frames: Option<u64>) {
        info!("Runtime loop started. Tick: {}ms", self.tick_ms);

        let mut cadence = interval(Duration::from_millis(self.tick_ms));
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut clock = FrameClock::start(MAX_FRAME_SECS);
        let mut frames = 0u64;

        loop {
            // Driver: Wait for physical time boundary
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = cadence.tick() => {}
            }

            // Driver: Drain Events
            let mut events = Vec::new();
            while let Ok(event) = self.receiver.try_recv() {
                events.push(event);
            }

            // Core: Execute Step
            if let Err(e) = self.tick_step(events, clock.delta()) {
                error!(tick = self.tick.frame, "frame aborted: {e}");
            }

            frames += 1;
            if self.shutdown_requested || max_frames.is_some_and(|max| frames >= max) {
                break;
            }
        }

        self.telemetry.record(TelemetryEvent::Lifecycle(LifecycleEvent::Shutdown));
        info!(frames, "Runtime loop stopped");
    }
}

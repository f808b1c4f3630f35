use serde::{Deserialize, Serialize};
use tracing::trace;

use super::event::EntityId;
use super::host::Vec2;

/// Slot index plus the generation it was handed out in. A handle goes stale once
/// its slot is released, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Fixed-capacity object pool. Slots are reused; nothing is freed while the pool lives.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot { value: None, generation: 0 });
        // Reversed so the lowest slot is handed out first.
        let free = (0..capacity).rev().collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// `None` when every slot is in use.
    pub fn acquire(&mut self, value: T) -> Option<PoolHandle> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index];
        slot.value = Some(value);
        trace!(slot = index, generation = slot.generation, "pool acquire");
        Some(PoolHandle { index, generation: slot.generation })
    }

    /// `None` for stale or already released handles.
    pub fn release(&mut self, handle: PoolHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index).filter(|s| s.generation == handle.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        trace!(slot = handle.index, "pool release");
        Some(value)
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index).filter(|s| s.generation == handle.generation)?;
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index).filter(|s| s.generation == handle.generation)?;
        slot.value.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|v| (PoolHandle { index, generation: slot.generation }, v))
        })
    }

    /// Keeps the active values for which `keep` returns true, releasing the rest.
    pub fn retain_mut<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.as_mut() {
                if !keep(value) {
                    slot.value = None;
                    slot.generation = slot.generation.wrapping_add(1);
                    self.free.push(index);
                    released += 1;
                }
            }
        }
        released
    }
}

/// Pooled visual/gameplay effect (projectiles, puffs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub owner: EntityId,
    pub kind: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub ttl: f32,
}

/// Shared resources the runtime owns and lends to modules every phase.
#[derive(Debug, Clone)]
pub struct Resources {
    pub effects: Pool<Effect>,
}

impl Resources {
    pub fn new(effect_capacity: usize) -> Self {
        Self { effects: Pool::with_capacity(effect_capacity) }
    }

    /// Advances pooled effects and recycles expired ones. Returns how many expired.
    pub fn step_effects(&mut self, dt: f32) -> usize {
        self.effects.retain_mut(|effect| {
            effect.position = effect.position + effect.velocity * dt;
            effect.ttl -= dt;
            effect.ttl > 0.0
        })
    }
}

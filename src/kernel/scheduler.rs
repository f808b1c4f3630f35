use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Initialize,
    Update,
    FixedUpdate,
    LateUpdate,
}

/// What one host frame runs: an Update, `fixed_steps` FixedUpdates, then a LateUpdate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub dt: f32,
    pub fixed_dt: f32,
    pub fixed_steps: u32,
    /// Simulation time thrown away because the step cap was hit.
    pub dropped: f32,
}

/// Fixed-timestep accumulator.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    fixed_dt: f32,
    max_fixed_steps: u32,
    accumulator: f32,
}

impl FrameScheduler {
    pub fn new(fixed_dt: f32, max_fixed_steps: u32) -> Self {
        Self { fixed_dt, max_fixed_steps: max_fixed_steps.max(1), accumulator: 0.0 }
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Pure projection: frame delta -> plan. Mutates only the accumulator.
    pub fn schedule(&mut self, dt: f32) -> FramePlan {
        self.accumulate(dt);
        self.plan(dt)
    }

    /// Banks simulation time without consuming it. Negative deltas are ignored.
    pub fn accumulate(&mut self, dt: f32) {
        self.accumulator += dt.max(0.0);
    }

    /// Time banked but not yet consumed by a plan.
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Consumes whole fixed steps from the banked time. `dt` is only reported back.
    pub fn plan(&mut self, dt: f32) -> FramePlan {
        let mut fixed_steps = 0;
        while self.accumulator >= self.fixed_dt && fixed_steps < self.max_fixed_steps {
            self.accumulator -= self.fixed_dt;
            fixed_steps += 1;
        }

        // Spiral-of-death guard: never carry more than one step of debt.
        let mut dropped = 0.0;
        if self.accumulator >= self.fixed_dt {
            dropped = self.accumulator - self.accumulator % self.fixed_dt;
            self.accumulator -= dropped;
            debug!(dropped, "fixed step cap reached, dropping simulation time");
        }

        FramePlan { dt, fixed_dt: self.fixed_dt, fixed_steps, dropped }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

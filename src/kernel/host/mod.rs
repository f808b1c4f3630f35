//! Boundary collaborators.
//!
//! The kernel never renders, simulates physics or polls devices itself. Modules reach
//! those capabilities through the traits below; an engine binding (or [`sim::SimHost`])
//! provides them per entity.

pub mod sim;

use std::collections::{HashMap, HashSet};
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::event::EntityId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        self + (to - self) * t
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let d = other - self;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

pub trait Transform {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn rotation(&self) -> f32;
    fn set_rotation(&mut self, degrees: f32);
    fn scale(&self) -> Vec2;
    fn set_scale(&mut self, scale: Vec2);
}

pub trait PhysicsBody {
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    fn is_grounded(&self) -> bool;
}

pub trait SpriteRenderer {
    fn sprite(&self) -> &str;
    fn set_sprite(&mut self, sprite: &str);
    fn flip_x(&self) -> bool;
    fn set_flip_x(&mut self, flip: bool);
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
}

/// Polled once per frame; values are whatever the device layer last reported.
pub trait InputSource {
    fn axis(&self, name: &str) -> f32;
    fn button(&self, name: &str) -> bool;
}

pub trait AnimationPlayer {
    fn play(&mut self, clip: &str);
    fn current(&self) -> Option<&str>;
}

/// Everything a module may touch on the entity that owns its brain.
pub trait Host {
    fn entity(&self) -> EntityId;

    fn transform(&self) -> &dyn Transform;
    fn transform_mut(&mut self) -> &mut dyn Transform;

    fn body(&self) -> Option<&dyn PhysicsBody>;
    fn body_mut(&mut self) -> Option<&mut dyn PhysicsBody>;

    fn sprite(&self) -> Option<&dyn SpriteRenderer>;
    fn sprite_mut(&mut self) -> Option<&mut dyn SpriteRenderer>;

    fn animator(&self) -> Option<&dyn AnimationPlayer>;
    fn animator_mut(&mut self) -> Option<&mut dyn AnimationPlayer>;

    fn camera(&self) -> Option<&dyn Transform>;
    fn camera_mut(&mut self) -> Option<&mut dyn Transform>;

    fn input(&self) -> &dyn InputSource;
    /// Replaces the polled input with the latest device snapshot.
    fn set_input(&mut self, input: InputState);

    /// Engine physics step, run after every fixed update. Hosts driven by a real
    /// engine leave this empty.
    fn step_physics(&mut self, _dt: f32) {}
}

/// Snapshot of device state for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    axes: HashMap<String, f32>,
    buttons: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, name: &str, value: f32) -> Self {
        self.axes.insert(name.to_string(), value.clamp(-1.0, 1.0));
        self
    }

    pub fn with_button(mut self, name: &str) -> Self {
        self.buttons.insert(name.to_string());
        self
    }
}

impl InputSource for InputState {
    fn axis(&self, name: &str) -> f32 {
        self.axes.get(name).copied().unwrap_or(0.0)
    }

    fn button(&self, name: &str) -> bool {
        self.buttons.contains(name)
    }
}

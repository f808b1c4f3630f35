use super::{AnimationPlayer, Host, InputSource, InputState, PhysicsBody, SpriteRenderer, Transform, Vec2};
use crate::kernel::event::EntityId;

pub const GRAVITY: f32 = -30.0;
pub const GROUND_Y: f32 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimTransform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl SimTransform {
    pub fn at(position: Vec2) -> Self {
        Self { position, rotation: 0.0, scale: Vec2::ONE }
    }
}

impl Transform for SimTransform {
    fn position(&self) -> Vec2 {
        self.position
    }
    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }
    fn rotation(&self) -> f32 {
        self.rotation
    }
    fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
    }
    fn scale(&self) -> Vec2 {
        self.scale
    }
    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimBody {
    pub velocity: Vec2,
    pub grounded: bool,
}

impl PhysicsBody for SimBody {
    fn velocity(&self) -> Vec2 {
        self.velocity
    }
    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }
    fn is_grounded(&self) -> bool {
        self.grounded
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimSprite {
    pub sprite: String,
    pub flip_x: bool,
    pub alpha: f32,
}

impl Default for SimSprite {
    fn default() -> Self {
        Self { sprite: String::new(), flip_x: false, alpha: 1.0 }
    }
}

impl SpriteRenderer for SimSprite {
    fn sprite(&self) -> &str {
        &self.sprite
    }
    fn set_sprite(&mut self, sprite: &str) {
        self.sprite = sprite.to_string();
    }
    fn flip_x(&self) -> bool {
        self.flip_x
    }
    fn set_flip_x(&mut self, flip: bool) {
        self.flip_x = flip;
    }
    fn alpha(&self) -> f32 {
        self.alpha
    }
    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }
}

/// Records every clip started, so tests can assert on transitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimAnimator {
    pub history: Vec<String>,
}

impl AnimationPlayer for SimAnimator {
    fn play(&mut self, clip: &str) {
        self.history.push(clip.to_string());
    }
    fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
}

/// In-memory host with a flat floor at `GROUND_Y` and constant gravity.
#[derive(Debug, Clone)]
pub struct SimHost {
    pub entity: EntityId,
    pub transform: SimTransform,
    pub body: Option<SimBody>,
    pub sprite: Option<SimSprite>,
    pub animator: Option<SimAnimator>,
    pub camera: Option<SimTransform>,
    pub input: InputState,
}

impl SimHost {
    pub fn new(entity: EntityId, position: Vec2) -> Self {
        Self {
            entity,
            transform: SimTransform::at(position),
            body: Some(SimBody { velocity: Vec2::ZERO, grounded: position.y <= GROUND_Y }),
            sprite: Some(SimSprite::default()),
            animator: Some(SimAnimator::default()),
            camera: None,
            input: InputState::new(),
        }
    }

    /// Host with no body, sprite or animator (pickups, triggers).
    pub fn bare(entity: EntityId, position: Vec2) -> Self {
        Self {
            entity,
            transform: SimTransform::at(position),
            body: None,
            sprite: None,
            animator: None,
            camera: None,
            input: InputState::new(),
        }
    }

    pub fn with_camera(mut self, position: Vec2) -> Self {
        self.camera = Some(SimTransform::at(position));
        self
    }
}

impl Host for SimHost {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn transform(&self) -> &dyn Transform {
        &self.transform
    }
    fn transform_mut(&mut self) -> &mut dyn Transform {
        &mut self.transform
    }

    fn body(&self) -> Option<&dyn PhysicsBody> {
        self.body.as_ref().map(|b| b as &dyn PhysicsBody)
    }
    fn body_mut(&mut self) -> Option<&mut dyn PhysicsBody> {
        self.body.as_mut().map(|b| b as &mut dyn PhysicsBody)
    }

    fn sprite(&self) -> Option<&dyn SpriteRenderer> {
        self.sprite.as_ref().map(|s| s as &dyn SpriteRenderer)
    }
    fn sprite_mut(&mut self) -> Option<&mut dyn SpriteRenderer> {
        self.sprite.as_mut().map(|s| s as &mut dyn SpriteRenderer)
    }

    fn animator(&self) -> Option<&dyn AnimationPlayer> {
        self.animator.as_ref().map(|a| a as &dyn AnimationPlayer)
    }
    fn animator_mut(&mut self) -> Option<&mut dyn AnimationPlayer> {
        self.animator.as_mut().map(|a| a as &mut dyn AnimationPlayer)
    }

    fn camera(&self) -> Option<&dyn Transform> {
        self.camera.as_ref().map(|c| c as &dyn Transform)
    }
    fn camera_mut(&mut self) -> Option<&mut dyn Transform> {
        self.camera.as_mut().map(|c| c as &mut dyn Transform)
    }

    fn input(&self) -> &dyn InputSource {
        &self.input
    }
    fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    fn step_physics(&mut self, dt: f32) {
        let Some(body) = self.body.as_mut() else {
            return;
        };

        if !body.grounded {
            body.velocity.y += GRAVITY * dt;
        }

        let mut next = self.transform.position + body.velocity * dt;
        if next.y <= GROUND_Y {
            next.y = GROUND_Y;
            if body.velocity.y < 0.0 {
                body.velocity.y = 0.0;
            }
            body.grounded = true;
        } else {
            body.grounded = false;
        }
        self.transform.position = next;
    }
}

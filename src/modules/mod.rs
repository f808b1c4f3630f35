//! Stock modules for platformer characters.

pub mod animation;
pub mod camera;
pub mod inventory;
pub mod movement;
pub mod shooting;

pub use animation::{AnimationClips, AnimationModule};
pub use camera::CameraFollowModule;
pub use inventory::{InventoryModule, ItemStack};
pub use movement::MovementModule;
pub use shooting::ShootingModule;
